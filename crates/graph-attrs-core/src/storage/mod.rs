//! Storage layer for attribute values
//!
//! A sparse mapping from (entity id, attribute name, key tuple) to a stored
//! value. The typed façade in [`crate::attributes`] is the supported way in;
//! the value store stays reachable for low-level inspection and repair.

/// Sparse multi-dimensional value store
pub mod value_store;

/// Re-export main storage types
pub use value_store::{StoredValue, ValueStore};
