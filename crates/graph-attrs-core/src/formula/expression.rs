use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::constants::ID_REFERENCE;
use crate::schema::AttributeDefinition;
use crate::types::{float_text, ScalarValue, ShapeKind, ValueKind};

/// Static return type declared by a compiled formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormulaType {
    /// Single value of the given kind
    Scalar(ValueKind),
    /// Homogeneous list of the given kind
    List(ValueKind),
}

impl FormulaType {
    /// Kind of the value or of the list elements
    pub fn kind(&self) -> ValueKind {
        match self {
            FormulaType::Scalar(kind) | FormulaType::List(kind) => *kind,
        }
    }

    /// Whether an attribute with this definition may hold the formula
    ///
    /// Scalar attributes accept any scalar return kind (text results are parsed
    /// at coercion time). List attributes need a list of exactly their kind.
    /// Nothing else accepts formulas.
    pub fn is_compatible_with(&self, definition: &AttributeDefinition) -> bool {
        match (definition.shape(), self) {
            (ShapeKind::Scalar, FormulaType::Scalar(_)) => true,
            (ShapeKind::SimpleList, FormulaType::List(kind)) => *kind == definition.value_kind(),
            _ => false,
        }
    }
}

impl fmt::Display for FormulaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaType::Scalar(kind) => write!(f, "{}", kind),
            FormulaType::List(kind) => write!(f, "List<{}>", kind),
        }
    }
}

/// Raw value produced by an expression, and the form referenced attributes are
/// bound in. Integers are wide here and narrowed during coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    /// Boolean result
    Boolean(bool),
    /// Wide integer result
    Integer(i64),
    /// Float result
    Float(f64),
    /// Text result
    String(String),
    /// List result or bound list attribute
    List(Vec<FormulaValue>),
    /// Bound map attribute
    Map(BTreeMap<String, FormulaValue>),
}

impl FormulaValue {
    /// Short description of the value's type, for messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FormulaValue::Boolean(_) => "Boolean",
            FormulaValue::Integer(_) => "Integer",
            FormulaValue::Float(_) => "Float",
            FormulaValue::String(_) => "String",
            FormulaValue::List(_) => "List",
            FormulaValue::Map(_) => "Map",
        }
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaValue::Boolean(b) => write!(f, "{}", b),
            FormulaValue::Integer(i) => write!(f, "{}", i),
            FormulaValue::Float(x) => f.write_str(&float_text(*x)),
            FormulaValue::String(s) => f.write_str(s),
            FormulaValue::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            FormulaValue::Map(entries) => {
                let parts: Vec<String> = entries.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<ScalarValue> for FormulaValue {
    fn from(value: ScalarValue) -> Self {
        match value {
            ScalarValue::Boolean(b) => FormulaValue::Boolean(b),
            ScalarValue::Integer(i) => FormulaValue::Integer(i64::from(i)),
            ScalarValue::Float(x) => FormulaValue::Float(x),
            ScalarValue::String(s) => FormulaValue::String(s),
        }
    }
}

/// Values handed to an expression: resolved references plus the entity id
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    entity_id: String,
    values: AHashMap<String, FormulaValue>,
}

impl Bindings {
    /// Empty bindings for one entity
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            values: AHashMap::new(),
        }
    }

    /// Bind a referenced attribute's value
    pub fn insert(&mut self, name: impl Into<String>, value: FormulaValue) {
        self.values.insert(name.into(), value);
    }

    /// Id of the entity being evaluated (the `ID` pseudo-reference)
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Value bound to a reference. `ID` resolves to the entity id.
    pub fn get(&self, name: &str) -> Option<FormulaValue> {
        if name == ID_REFERENCE {
            return Some(FormulaValue::String(self.entity_id.clone()));
        }
        self.values.get(name).cloned()
    }

    /// Number of bound attributes
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no attribute is bound
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A compiled expression, produced outside the store
pub trait Expression: fmt::Debug + Send + Sync {
    /// Declared return type
    fn return_type(&self) -> FormulaType;

    /// Names the expression references, possibly including `ID`
    fn references(&self) -> Vec<String>;

    /// Evaluate against resolved bindings, or fail with a message
    fn evaluate(&self, bindings: &Bindings) -> Result<FormulaValue, String>;
}

/// Shared handle to a compiled formula
///
/// Caches the return type and the deduplicated reference list so the store
/// does not call back into the expression for them.
#[derive(Clone)]
pub struct FormulaExpr {
    expression: Arc<dyn Expression>,
    return_type: FormulaType,
    references: Arc<[String]>,
}

impl FormulaExpr {
    /// Wrap a compiled expression
    pub fn new(expression: impl Expression + 'static) -> Self {
        Self::from_arc(Arc::new(expression))
    }

    /// Wrap an already shared expression
    pub fn from_arc(expression: Arc<dyn Expression>) -> Self {
        let return_type = expression.return_type();
        let mut references = expression.references();
        references.sort_unstable();
        references.dedup();
        Self {
            expression,
            return_type,
            references: references.into(),
        }
    }

    /// Declared return type
    pub fn return_type(&self) -> FormulaType {
        self.return_type
    }

    /// Every referenced name, sorted, including `ID` if used
    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Referenced attribute names, excluding the `ID` pseudo-reference
    pub fn attribute_references(&self) -> impl Iterator<Item = &str> + '_ {
        self.references
            .iter()
            .map(String::as_str)
            .filter(|name| *name != ID_REFERENCE)
    }

    /// Run the expression
    pub fn evaluate(&self, bindings: &Bindings) -> Result<FormulaValue, String> {
        self.expression.evaluate(bindings)
    }

    /// The underlying expression
    pub fn expression(&self) -> &dyn Expression {
        self.expression.as_ref()
    }
}

impl fmt::Debug for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormulaExpr")
            .field("return_type", &self.return_type)
            .field("references", &self.references)
            .field("expression", &self.expression)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Echo(Vec<String>);

    impl Expression for Echo {
        fn return_type(&self) -> FormulaType {
            FormulaType::Scalar(ValueKind::String)
        }

        fn references(&self) -> Vec<String> {
            self.0.clone()
        }

        fn evaluate(&self, bindings: &Bindings) -> Result<FormulaValue, String> {
            Ok(FormulaValue::String(bindings.entity_id().to_string()))
        }
    }

    #[test]
    fn references_are_deduplicated_and_id_is_filtered() {
        let formula = FormulaExpr::new(Echo(vec!["b".into(), "ID".into(), "a".into(), "b".into()]));
        assert_eq!(formula.references(), &["ID".to_string(), "a".into(), "b".into()]);
        let attrs: Vec<&str> = formula.attribute_references().collect();
        assert_eq!(attrs, vec!["a", "b"]);
    }

    #[test]
    fn id_binding_resolves_to_entity() {
        let bindings = Bindings::new("n7");
        assert_eq!(bindings.get("ID"), Some(FormulaValue::String("n7".into())));
        assert_eq!(bindings.get("other"), None);
    }

    #[test]
    fn compatibility_table() {
        let scalar = AttributeDefinition::scalar("s", ValueKind::Integer);
        let list = AttributeDefinition::list("l", ValueKind::Float);
        let map = AttributeDefinition::map("m", ValueKind::String);

        for kind in ValueKind::ALL {
            assert!(FormulaType::Scalar(kind).is_compatible_with(&scalar));
            assert!(!FormulaType::Scalar(kind).is_compatible_with(&map));
            assert!(!FormulaType::List(kind).is_compatible_with(&scalar));
        }
        assert!(FormulaType::List(ValueKind::Float).is_compatible_with(&list));
        assert!(!FormulaType::List(ValueKind::Integer).is_compatible_with(&list));
        assert!(!FormulaType::Scalar(ValueKind::Float).is_compatible_with(&list));
    }
}
