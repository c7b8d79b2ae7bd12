//! Attribute definitions
//!
//! An attribute name maps to a fixed value kind and a fixed sequence of key
//! dimensions. Definitions are created on first write and only go away when the
//! whole attribute is deleted.

/// Attribute definition and signature helpers
pub mod definition;
/// Name to definition registry
pub mod registry;

pub use definition::AttributeDefinition;
pub use registry::DefinitionRegistry;
