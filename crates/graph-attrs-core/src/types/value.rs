//! Value type system
//!
//! The closed set of scalar kinds an attribute can hold, the key parts that
//! address entries inside multi-dimensional attributes, and the shapes derived
//! from an attribute's key dimensions.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Scalar kind of an attribute, fixed on first write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueKind {
    /// `true` / `false`
    Boolean,
    /// Native 32-bit signed integer
    Integer,
    /// 64-bit floating point
    Float,
    /// UTF-8 text
    String,
}

impl ValueKind {
    /// All scalar kinds, in declaration order
    pub const ALL: [ValueKind; 4] = [
        ValueKind::Boolean,
        ValueKind::Integer,
        ValueKind::Float,
        ValueKind::String,
    ];

    /// Human readable name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Boolean => "Boolean",
            ValueKind::Integer => "Integer",
            ValueKind::Float => "Float",
            ValueKind::String => "String",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of a single key dimension. Key dimensions draw from the same four
/// scalar kinds as values.
pub type DimKind = ValueKind;

/// A single scalar value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i32),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

impl ScalarValue {
    /// Kind tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            ScalarValue::Boolean(_) => ValueKind::Boolean,
            ScalarValue::Integer(_) => ValueKind::Integer,
            ScalarValue::Float(_) => ValueKind::Float,
            ScalarValue::String(_) => ValueKind::String,
        }
    }

    /// Boolean payload, if this is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            ScalarValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer payload, if this is an integer
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            ScalarValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Float payload, if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ScalarValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// String payload, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Consume the value, returning the owned string payload
    pub fn into_string(self) -> Option<String> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Boolean(b) => write!(f, "{}", b),
            ScalarValue::Integer(i) => write!(f, "{}", i),
            ScalarValue::Float(x) => f.write_str(&float_text(*x)),
            ScalarValue::String(s) => f.write_str(s),
        }
    }
}

/// Textual form of a float. Integral values keep a trailing `.0`.
pub fn float_text(x: f64) -> String {
    format!("{:?}", x)
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Integer(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::String(value)
    }
}

/// One component of a key tuple
///
/// Floats compare by their IEEE total order so key parts can be ordered and
/// hashed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    /// Boolean key
    Boolean(bool),
    /// Integer key (list index)
    Integer(i32),
    /// Float key
    Float(f64),
    /// String key (map key)
    String(String),
}

impl KeyPart {
    /// Dimension kind this key part belongs to
    pub fn kind(&self) -> DimKind {
        match self {
            KeyPart::Boolean(_) => ValueKind::Boolean,
            KeyPart::Integer(_) => ValueKind::Integer,
            KeyPart::Float(_) => ValueKind::Float,
            KeyPart::String(_) => ValueKind::String,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            KeyPart::Boolean(_) => 0,
            KeyPart::Integer(_) => 1,
            KeyPart::Float(_) => 2,
            KeyPart::String(_) => 3,
        }
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyPart {}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Boolean(a), KeyPart::Boolean(b)) => a.cmp(b),
            (KeyPart::Integer(a), KeyPart::Integer(b)) => a.cmp(b),
            (KeyPart::Float(a), KeyPart::Float(b)) => a.total_cmp(b),
            (KeyPart::String(a), KeyPart::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for KeyPart {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            KeyPart::Boolean(b) => b.hash(state),
            KeyPart::Integer(i) => i.hash(state),
            KeyPart::Float(x) => x.to_bits().hash(state),
            KeyPart::String(s) => s.hash(state),
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Boolean(b) => write!(f, "{}", b),
            KeyPart::Integer(i) => write!(f, "{}", i),
            KeyPart::Float(x) => f.write_str(&float_text(*x)),
            KeyPart::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i32> for KeyPart {
    fn from(value: i32) -> Self {
        KeyPart::Integer(value)
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::String(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::String(value)
    }
}

/// Address of an entry inside one entity's attribute. Empty for scalars.
pub type KeyTuple = Vec<KeyPart>;

/// Shape of an attribute, derived from its key dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    /// No key dimensions
    Scalar,
    /// Exactly one integer dimension
    SimpleList,
    /// Exactly one string dimension
    SimpleMap,
    /// Any other combination of dimensions
    Complex,
    /// Never written
    Undefined,
}

impl ShapeKind {
    /// Derive the shape of an attribute from its key dimensions
    pub fn from_dims(key_dims: &[DimKind]) -> Self {
        match key_dims {
            [] => ShapeKind::Scalar,
            [ValueKind::Integer] => ShapeKind::SimpleList,
            [ValueKind::String] => ShapeKind::SimpleMap,
            _ => ShapeKind::Complex,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Scalar => "scalar",
            ShapeKind::SimpleList => "list",
            ShapeKind::SimpleMap => "map",
            ShapeKind::Complex => "complex",
            ShapeKind::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

/// Result of the shape-dispatching generic getter
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DynamicValue {
    /// Nothing stored, or the attribute is undefined or complex
    #[default]
    Absent,
    /// Scalar attribute value
    Scalar(ScalarValue),
    /// Simple list attribute value
    List(Vec<ScalarValue>),
    /// Simple map attribute value
    Map(BTreeMap<String, ScalarValue>),
}

impl DynamicValue {
    /// Whether no value was found
    pub fn is_absent(&self) -> bool {
        matches!(self, DynamicValue::Absent)
    }
}

impl fmt::Display for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicValue::Absent => f.write_str("<absent>"),
            DynamicValue::Scalar(v) => write!(f, "{}", v),
            DynamicValue::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            DynamicValue::Map(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{:?}: {}", k, v))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_derivation() {
        assert_eq!(ShapeKind::from_dims(&[]), ShapeKind::Scalar);
        assert_eq!(ShapeKind::from_dims(&[ValueKind::Integer]), ShapeKind::SimpleList);
        assert_eq!(ShapeKind::from_dims(&[ValueKind::String]), ShapeKind::SimpleMap);
        assert_eq!(ShapeKind::from_dims(&[ValueKind::Float]), ShapeKind::Complex);
        assert_eq!(
            ShapeKind::from_dims(&[ValueKind::Integer, ValueKind::Integer]),
            ShapeKind::Complex
        );
    }

    #[test]
    fn float_keys_are_totally_ordered() {
        let mut keys = vec![KeyPart::Float(2.5), KeyPart::Float(-1.0), KeyPart::Float(f64::NAN)];
        keys.sort();
        assert_eq!(keys[0], KeyPart::Float(-1.0));
        assert_eq!(keys[1], KeyPart::Float(2.5));
        assert_eq!(KeyPart::Float(f64::NAN), KeyPart::Float(f64::NAN));
    }

    #[test]
    fn float_text_keeps_fraction() {
        assert_eq!(ScalarValue::Float(3.0).to_string(), "3.0");
        assert_eq!(ScalarValue::Float(5.5).to_string(), "5.5");
        assert_eq!(ScalarValue::Integer(-4).to_string(), "-4");
    }

    #[test]
    fn untagged_scalars_pick_the_narrowest_kind() {
        let values: Vec<ScalarValue> = serde_json::from_str(r#"[true, 3, 3.5, "x"]"#).unwrap();
        let kinds: Vec<ValueKind> = values.iter().map(ScalarValue::kind).collect();
        assert_eq!(
            kinds,
            vec![ValueKind::Boolean, ValueKind::Integer, ValueKind::Float, ValueKind::String]
        );
    }
}
