//! JSON seed files
//!
//! A seed fills an [`AppContext`] with attribute values per entity class:
//!
//! ```json
//! {
//!   "nodes": {
//!     "n1": {
//!       "Rank": 3,
//!       "Scores": [10, 20, 30],
//!       "Weights": {"a": 1.0, "b": 2.0},
//!       "Double": {"formula": {"node": "binary", "op": "mul",
//!                              "left": {"node": "attr", "name": "Rank", "kind": "Integer"},
//!                              "right": {"node": "literal", "value": 2}}}
//!     }
//!   }
//! }
//! ```
//!
//! Plain values are written before formulas so formula definitions never
//! claim a name first. JSON integers must fit the 32-bit attribute integer;
//! wider ones are rejected rather than read as floats.

use std::collections::BTreeMap;
use std::path::Path;

use graph_attrs_core::{AttributeStore, Expr, ScalarValue};
use serde::Deserialize;
use tracing::{debug, info};

use crate::context::{AppContext, EntityClass};
use crate::core::error::{Error, Result};

/// Attributes of one entity, by name
pub type EntitySeed = BTreeMap<String, SeedValue>;

/// One attribute value in a seed
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SeedValue {
    /// A compiled formula
    Formula {
        /// Expression tree
        formula: Expr,
    },
    /// Scalar value
    Scalar(SeedScalar),
    /// Simple list
    List(Vec<SeedScalar>),
    /// Simple map
    Map(BTreeMap<String, SeedScalar>),
}

/// A scalar as written in JSON, before range checks
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SeedScalar {
    /// true or false
    Boolean(bool),
    /// Any JSON integer that fits in 64 bits
    Integer(i64),
    /// Number with a fraction or exponent
    Float(f64),
    /// Text
    String(String),
}

impl SeedScalar {
    /// Convert to a store value, rejecting integers outside the 32-bit range
    pub fn to_scalar(&self) -> Result<ScalarValue> {
        Ok(match self {
            SeedScalar::Boolean(b) => ScalarValue::Boolean(*b),
            SeedScalar::Integer(i) => ScalarValue::Integer(i32::try_from(*i).map_err(|_| {
                Error::invalid_input(format!("integer {} is outside the 32-bit integer range", i))
            })?),
            SeedScalar::Float(x) => ScalarValue::Float(*x),
            SeedScalar::String(s) => ScalarValue::String(s.clone()),
        })
    }
}

impl SeedValue {
    fn is_formula(&self) -> bool {
        matches!(self, SeedValue::Formula { .. })
    }
}

/// Contents of a seed file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Seed {
    /// Node attributes by entity id
    #[serde(default)]
    pub nodes: BTreeMap<String, EntitySeed>,

    /// Edge attributes by entity id
    #[serde(default)]
    pub edges: BTreeMap<String, EntitySeed>,

    /// Network attributes by entity id
    #[serde(default)]
    pub networks: BTreeMap<String, EntitySeed>,
}

impl Seed {
    /// Read a seed from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let seed = Self::parse(&contents)?;
        info!("Loaded seed from {}", path.display());
        Ok(seed)
    }

    /// Parse a seed from JSON text
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Entities of one class
    pub fn entities(&self, class: EntityClass) -> &BTreeMap<String, EntitySeed> {
        match class {
            EntityClass::Node => &self.nodes,
            EntityClass::Edge => &self.edges,
            EntityClass::Network => &self.networks,
        }
    }

    /// Write every value into the context, returning how many were written
    ///
    /// Stops at the first structural error, naming the entity and attribute.
    pub fn apply(&self, context: &AppContext) -> Result<usize> {
        let mut written = 0;
        for class in EntityClass::ALL {
            let mut store = context.store(class).write();
            // Plain values first, then formulas
            for formulas in [false, true] {
                for (entity, attributes) in self.entities(class) {
                    for (name, value) in attributes.iter().filter(|(_, v)| v.is_formula() == formulas) {
                        apply_value(&mut store, entity, name, value).map_err(|e| {
                            let reason = match e {
                                Error::InvalidInput(reason) => reason,
                                other => other.to_string(),
                            };
                            Error::invalid_input(format!("{} '{}', attribute '{}': {}", class, entity, name, reason))
                        })?;
                        written += 1;
                    }
                }
            }
            debug!("Seeded {} store: {} attributes defined", class, store.attribute_count());
        }
        Ok(written)
    }
}

fn apply_value(store: &mut AttributeStore, entity: &str, name: &str, value: &SeedValue) -> Result<()> {
    match value {
        SeedValue::Scalar(v) => store.set_attribute(entity, name, v.to_scalar()?)?,
        SeedValue::List(items) => {
            let items = items.iter().map(SeedScalar::to_scalar).collect::<Result<Vec<_>>>()?;
            store.set_list_attribute(entity, name, items)?
        }
        SeedValue::Map(entries) => {
            let entries = entries
                .iter()
                .map(|(key, v)| Ok((key.clone(), v.to_scalar()?)))
                .collect::<Result<BTreeMap<_, _>>>()?;
            store.set_map_attribute(entity, name, entries)?
        }
        SeedValue::Formula { formula } => store.set_formula_attribute(entity, name, formula.clone())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_attrs_core::ShapeKind;

    const SEED: &str = r#"{
        "nodes": {
            "n1": {
                "Rank": 3,
                "Label": "hub",
                "Scores": [10, 20, 30],
                "Weights": {"a": 1.0, "b": 2.5},
                "Double": {"formula": {
                    "node": "binary", "op": "mul",
                    "left": {"node": "attr", "name": "Rank", "kind": "Integer"},
                    "right": {"node": "literal", "value": 2}
                }}
            }
        },
        "edges": {
            "e1": {"Rank": 1.5}
        }
    }"#;

    #[test]
    fn values_are_classified() {
        let seed = Seed::parse(SEED).unwrap();
        let n1 = &seed.nodes["n1"];
        assert_eq!(n1["Rank"], SeedValue::Scalar(SeedScalar::Integer(3)));
        assert_eq!(seed.edges["e1"]["Rank"], SeedValue::Scalar(SeedScalar::Float(1.5)));
        assert!(matches!(n1["Scores"], SeedValue::List(ref v) if v.len() == 3));
        assert!(matches!(n1["Weights"], SeedValue::Map(ref m) if m.len() == 2));
        assert!(n1["Double"].is_formula());
        assert!(seed.networks.is_empty());
    }

    #[test]
    fn apply_fills_each_store() {
        let seed = Seed::parse(SEED).unwrap();
        let context = AppContext::default();
        assert_eq!(seed.apply(&context).unwrap(), 6);

        let nodes = context.nodes.read();
        assert_eq!(nodes.get_integer_attribute("n1", "Double").unwrap(), Some(6));
        assert_eq!(nodes.shape_kind("Weights"), ShapeKind::SimpleMap);
        let edges = context.edges.read();
        assert_eq!(edges.get_float_attribute("e1", "Rank").unwrap(), Some(1.5));
    }

    #[test]
    fn conflicts_name_the_attribute() {
        let seed = Seed::parse(r#"{"nodes": {"a": {"X": 1}, "b": {"X": "one"}}}"#).unwrap();
        let err = seed.apply(&AppContext::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("node 'b'"), "{}", message);
        assert!(message.contains("attribute 'X'"), "{}", message);
    }

    #[test]
    fn wide_integers_are_rejected_not_read_as_floats() {
        let seed = Seed::parse(r#"{"nodes": {"n1": {"Big": 3000000000}}}"#).unwrap();
        assert_eq!(seed.nodes["n1"]["Big"], SeedValue::Scalar(SeedScalar::Integer(3_000_000_000)));

        let context = AppContext::default();
        let err = seed.apply(&context).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        let message = err.to_string();
        assert!(message.contains("attribute 'Big'"), "{}", message);
        assert!(message.contains("3000000000"), "{}", message);
        assert_eq!(context.nodes.read().value_kind("Big"), None);

        let seed = Seed::parse(r#"{"nodes": {"n1": {"Scores": [1, -3000000000]}}}"#).unwrap();
        let err = seed.apply(&AppContext::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(Seed::parse(r#"{"vertices": {}}"#).is_err());
    }
}
