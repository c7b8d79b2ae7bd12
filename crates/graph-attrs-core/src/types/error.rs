//! Error types for the attribute store
//!
//! Structural failures (type lock-in, shape, heterogeneous input, formula
//! compatibility) are returned as [`AttributeError`]. Failures that happen while
//! evaluating a formula are [`EvaluationError`]s; the façade captures those as a
//! "last error" instead of returning them from typed getters.

use thiserror::Error;

use crate::formula::FormulaType;
use crate::types::{ShapeKind, ValueKind};

/// Result type for structural store operations
pub type Result<T> = std::result::Result<T, AttributeError>;

/// Structural errors raised synchronously by store operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttributeError {
    /// Write disagrees with the locked-in kind or shape of the attribute
    #[error("Type conflict on attribute '{name}': defined as {existing}, attempted {attempted}")]
    TypeConflict {
        /// Attribute name
        name: String,
        /// Signature of the existing definition
        existing: String,
        /// Signature the write required
        attempted: String,
    },

    /// Accessor kind does not match the attribute's defined kind
    #[error("Attribute '{name}' holds {actual} values, not {requested}")]
    WrongType {
        /// Attribute name
        name: String,
        /// Kind the attribute was defined with
        actual: ValueKind,
        /// Kind the accessor asked for
        requested: ValueKind,
    },

    /// Accessor shape does not match the attribute's shape
    #[error("Attribute '{name}' is a {actual} attribute, not a {requested} attribute")]
    WrongShape {
        /// Attribute name
        name: String,
        /// Shape of the definition
        actual: ShapeKind,
        /// Shape the accessor works with
        requested: ShapeKind,
    },

    /// Key tuple arity does not match the attribute's key dimensions
    #[error("Key arity mismatch on attribute '{name}': expected {expected} dimensions, got {actual}")]
    ShapeMismatch {
        /// Attribute name
        name: String,
        /// Number of key dimensions of the definition
        expected: usize,
        /// Length of the supplied key tuple
        actual: usize,
    },

    /// A key part has the wrong kind for its dimension
    #[error("Key kind mismatch on attribute '{name}' at dimension {dimension}: expected {expected}, got {actual}")]
    KeyKindMismatch {
        /// Attribute name
        name: String,
        /// Zero-based dimension index
        dimension: usize,
        /// Kind of the dimension
        expected: ValueKind,
        /// Kind of the supplied key part
        actual: ValueKind,
    },

    /// List input mixes scalar kinds
    #[error("Heterogeneous list for attribute '{name}': element {index} is {found}, expected {expected}")]
    HeterogeneousList {
        /// Attribute name
        name: String,
        /// Kind of the first element
        expected: ValueKind,
        /// Kind of the offending element
        found: ValueKind,
        /// Index of the offending element
        index: usize,
    },

    /// Map input mixes scalar kinds
    #[error("Heterogeneous map for attribute '{name}': value at key '{key}' is {found}, expected {expected}")]
    HeterogeneousMap {
        /// Attribute name
        name: String,
        /// Kind of the first value
        expected: ValueKind,
        /// Kind of the offending value
        found: ValueKind,
        /// Key of the offending value
        key: String,
    },

    /// Formula return type is outside the compatibility table for the attribute
    #[error("Incompatible equation for attribute '{name}': {definition} cannot hold a formula returning {returns}")]
    IncompatibleEquation {
        /// Attribute name
        name: String,
        /// Signature of the attribute definition
        definition: String,
        /// Declared return type of the formula
        returns: FormulaType,
    },

    /// Low-level write against an attribute that has no definition
    #[error("Attribute not defined: {name}")]
    UnknownAttribute {
        /// Attribute name
        name: String,
    },
}

/// Errors captured while evaluating a formula
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// The attribute is already being evaluated further up the recursion
    #[error("Recursive evaluation of attribute '{name}'")]
    RecursiveEvaluation {
        /// Attribute whose evaluation re-entered itself
        name: String,
    },

    /// A referenced attribute has no value for the entity
    #[error("Attribute '{name}' references '{reference}', which has no value for entity '{entity}'")]
    MissingReference {
        /// Attribute holding the formula
        name: String,
        /// Unresolved reference
        reference: String,
        /// Entity being evaluated
        entity: String,
    },

    /// The expression evaluator failed
    #[error("Evaluation of attribute '{name}' failed: {message}")]
    Evaluation {
        /// Attribute holding the formula
        name: String,
        /// Message passed through from the evaluator
        message: String,
    },

    /// The raw result could not be coerced to the attribute's kind
    #[error("Cannot convert result of attribute '{name}' to {target}: {source}")]
    Coercion {
        /// Attribute holding the formula
        name: String,
        /// Kind the result was coerced to
        target: ValueKind,
        /// Underlying coercion failure
        source: CoercionError,
    },

    /// Nested evaluation went deeper than the configured limit
    #[error("Evaluation of attribute '{name}' exceeded the depth limit of {limit}")]
    DepthLimitExceeded {
        /// Attribute at which the limit was hit
        name: String,
        /// Configured limit
        limit: usize,
    },
}

impl EvaluationError {
    /// Attribute the failure is reported against
    pub fn attribute(&self) -> &str {
        match self {
            EvaluationError::RecursiveEvaluation { name }
            | EvaluationError::MissingReference { name, .. }
            | EvaluationError::Evaluation { name, .. }
            | EvaluationError::Coercion { name, .. }
            | EvaluationError::DepthLimitExceeded { name, .. } => name,
        }
    }

    /// Check if this failure came from a reference cycle
    pub fn is_recursive(&self) -> bool {
        matches!(self, EvaluationError::RecursiveEvaluation { .. })
    }
}

/// Spreadsheet-style coercion failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    /// Numeric value does not fit the native integer range
    #[error("value {value} is outside the integer range")]
    OutOfRange {
        /// Textual form of the value
        value: String,
    },

    /// Text could not be parsed as a number
    #[error("'{text}' is not a number")]
    Unparseable {
        /// Offending text
        text: String,
    },

    /// Text is neither "true" nor "false"
    #[error("'{text}' is not a boolean")]
    NotBoolean {
        /// Offending text
        text: String,
    },

    /// The value's shape cannot become the target kind at all
    #[error("{found} cannot be converted to {target}")]
    Unsupported {
        /// Description of the value
        found: String,
        /// Target kind
        target: ValueKind,
    },
}

/// Structural errors found while ordering formula dependencies
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderingError {
    /// The reference graph contains a cycle
    #[error("Dependency cycle among attributes: {}", .involved.join(", "))]
    Cycle {
        /// Attributes that could not be ordered
        involved: Vec<String>,
    },
}
