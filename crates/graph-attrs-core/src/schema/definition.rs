use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{DimKind, ShapeKind, ValueKind};

/// Locked-in signature of an attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDefinition {
    name: String,
    value_kind: ValueKind,
    key_dims: Vec<DimKind>,
}

impl AttributeDefinition {
    /// Create a definition with arbitrary key dimensions
    pub fn new(name: impl Into<String>, value_kind: ValueKind, key_dims: Vec<DimKind>) -> Self {
        Self {
            name: name.into(),
            value_kind,
            key_dims,
        }
    }

    /// Scalar definition (no key dimensions)
    pub fn scalar(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self::new(name, value_kind, Vec::new())
    }

    /// Simple list definition (one integer dimension)
    pub fn list(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self::new(name, value_kind, vec![ValueKind::Integer])
    }

    /// Simple map definition (one string dimension)
    pub fn map(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self::new(name, value_kind, vec![ValueKind::String])
    }

    /// Attribute name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Kind of every value stored under this attribute
    pub fn value_kind(&self) -> ValueKind {
        self.value_kind
    }

    /// Kinds of the key dimensions, in order
    pub fn key_dims(&self) -> &[DimKind] {
        &self.key_dims
    }

    /// Number of key dimensions
    pub fn arity(&self) -> usize {
        self.key_dims.len()
    }

    /// Shape derived from the key dimensions
    pub fn shape(&self) -> ShapeKind {
        ShapeKind::from_dims(&self.key_dims)
    }

    /// Whether the kind and key dimensions equal the given ones
    pub fn matches(&self, value_kind: ValueKind, key_dims: &[DimKind]) -> bool {
        self.value_kind == value_kind && self.key_dims == key_dims
    }
}

impl fmt::Display for AttributeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&signature(self.value_kind, &self.key_dims))
    }
}

/// Render a kind plus key dimensions as e.g. `Integer`, `Float[Integer]`
/// or `String[String, Integer]`.
pub fn signature(value_kind: ValueKind, key_dims: &[DimKind]) -> String {
    if key_dims.is_empty() {
        return value_kind.to_string();
    }
    let dims: Vec<&str> = key_dims.iter().map(ValueKind::name).collect();
    format!("{}[{}]", value_kind, dims.join(", "))
}
