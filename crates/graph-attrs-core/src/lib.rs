//! # Graph Attributes Core
//!
//! Typed, multi-dimensional attribute storage for graph entities together with
//! lazy formula evaluation. One [`AttributeStore`] is kept per entity class
//! (nodes, edges, networks); each store owns its own attribute definitions.

#![warn(missing_docs)]

/// Logging macros and store configuration
pub mod core;

/// Value, key and error types
pub mod types;

/// Attribute definitions and the definition registry
pub mod schema;

/// Sparse multi-dimensional value storage
pub mod storage;

/// Formula representation, evaluation state and coercion
pub mod formula;

/// Typed accessor façade
pub mod attributes;

/// Dependency ordering of formula attributes
pub mod dependency;

/// System constants
pub mod constants;

#[doc(hidden)]
pub use tracing;

// Re-export commonly used items
pub use attributes::{AttributeStore, Recomputed};
pub use core::config::StoreConfig;
pub use dependency::DependencyGraph;
pub use formula::{Bindings, Expr, Expression, FormulaExpr, FormulaType, FormulaValue};
pub use schema::{AttributeDefinition, DefinitionRegistry};
pub use storage::{StoredValue, ValueStore};
pub use types::{
    AttributeError, CoercionError, DimKind, DynamicValue, EvaluationError, KeyPart, KeyTuple,
    OrderingError, Result, ScalarValue, ShapeKind, ValueKind,
};
