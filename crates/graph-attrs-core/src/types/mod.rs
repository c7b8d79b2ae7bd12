//! Type definitions for the attribute store
//!
//! Scalar kinds, key parts, shapes and every error family.

/// Scalar kinds, values, keys and shapes
pub mod value;
/// Error types
pub mod error;

// Re-export commonly used types for convenience
pub use value::{float_text, DimKind, DynamicValue, KeyPart, KeyTuple, ScalarValue, ShapeKind, ValueKind};
pub use error::{AttributeError, CoercionError, EvaluationError, OrderingError, Result};
