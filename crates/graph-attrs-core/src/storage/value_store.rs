//! Multi-dimensional value store
//!
//! Entries are grouped per attribute, then per entity, then ordered by key
//! tuple:
//! - attribute name → entity id → key tuple → [`StoredValue`]
//! - every entry of an attribute shares its [`AttributeDefinition`]
//! - at most one value per (entity, attribute, key tuple)
//!
//! Entity ids are opaque; nothing here checks them against a graph.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::formula::FormulaExpr;
use crate::schema::{AttributeDefinition, DefinitionRegistry};
use crate::types::{AttributeError, DimKind, KeyPart, KeyTuple, Result, ScalarValue, ValueKind};
use crate::log_debug;

/// Value held at one entry
#[derive(Debug, Clone)]
pub enum StoredValue {
    /// Plain scalar of the attribute's kind
    Scalar(ScalarValue),
    /// Formula stored verbatim, evaluated on read
    Formula(FormulaExpr),
}

impl StoredValue {
    /// Scalar payload, if this entry is not a formula
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            StoredValue::Scalar(v) => Some(v),
            StoredValue::Formula(_) => None,
        }
    }

    /// Formula payload, if this entry is a formula
    pub fn as_formula(&self) -> Option<&FormulaExpr> {
        match self {
            StoredValue::Formula(f) => Some(f),
            StoredValue::Scalar(_) => None,
        }
    }
}

impl From<ScalarValue> for StoredValue {
    fn from(value: ScalarValue) -> Self {
        StoredValue::Scalar(value)
    }
}

impl From<FormulaExpr> for StoredValue {
    fn from(formula: FormulaExpr) -> Self {
        StoredValue::Formula(formula)
    }
}

type EntityEntries = BTreeMap<KeyTuple, StoredValue>;

/// Sparse value store with its definition registry
#[derive(Debug, Default, Clone)]
pub struct ValueStore {
    registry: DefinitionRegistry,
    entries: AHashMap<String, AHashMap<String, EntityEntries>>,
}

impl ValueStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the definitions
    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }

    /// Define an attribute, or confirm an identical existing definition
    pub fn define(
        &mut self,
        name: &str,
        value_kind: ValueKind,
        key_dims: &[DimKind],
    ) -> Result<&AttributeDefinition> {
        self.registry.define(name, value_kind, key_dims)
    }

    /// Look up the definition of an attribute
    pub fn lookup(&self, name: &str) -> Option<&AttributeDefinition> {
        self.registry.lookup(name)
    }

    /// Remove a definition together with every entry stored under it
    pub fn undefine(&mut self, name: &str) -> bool {
        let removed = self.entries.remove(name).map_or(0, |entities| entities.len());
        let existed = self.registry.remove(name).is_some();
        if existed {
            log_debug!("Undefined attribute '{}' ({} entities cleared)", name, removed);
        }
        existed
    }

    /// Value stored at an exact key tuple
    pub fn get(&self, entity_id: &str, name: &str, key: &[KeyPart]) -> Option<&StoredValue> {
        self.entries.get(name)?.get(entity_id)?.get(key)
    }

    /// Store a value, overwriting whatever was at the same key tuple
    ///
    /// The attribute must already be defined, the key tuple must match its
    /// dimensions, and scalar values must carry the defined kind.
    pub fn set(
        &mut self,
        entity_id: &str,
        name: &str,
        key: KeyTuple,
        value: StoredValue,
    ) -> Result<()> {
        let def = self.registry.lookup(name).ok_or_else(|| AttributeError::UnknownAttribute {
            name: name.to_string(),
        })?;
        check_key(def, &key)?;
        if let StoredValue::Scalar(scalar) = &value {
            if scalar.kind() != def.value_kind() {
                return Err(AttributeError::TypeConflict {
                    name: name.to_string(),
                    existing: def.to_string(),
                    attempted: scalar.kind().to_string(),
                });
            }
        }

        self.entries
            .entry(name.to_string())
            .or_default()
            .entry(entity_id.to_string())
            .or_default()
            .insert(key, value);
        Ok(())
    }

    /// Remove the entry at an exact key tuple
    pub fn remove(&mut self, entity_id: &str, name: &str, key: &[KeyPart]) -> bool {
        let Some(entities) = self.entries.get_mut(name) else {
            return false;
        };
        let Some(entries) = entities.get_mut(entity_id) else {
            return false;
        };
        let removed = entries.remove(key).is_some();
        if entries.is_empty() {
            entities.remove(entity_id);
        }
        removed
    }

    /// Remove every entry of one entity under one attribute, whatever the key
    pub fn remove_all(&mut self, entity_id: &str, name: &str) -> bool {
        self.entries
            .get_mut(name)
            .and_then(|entities| entities.remove(entity_id))
            .is_some_and(|entries| !entries.is_empty())
    }

    /// Key tuples present for one entity under one attribute, in key order
    pub fn keys_for<'a>(
        &'a self,
        entity_id: &str,
        name: &str,
    ) -> impl Iterator<Item = &'a KeyTuple> + 'a {
        self.entity_entries(entity_id, name)
            .into_iter()
            .flat_map(|entries| entries.keys())
    }

    /// Entries for one entity under one attribute, in key order
    pub fn entries_for<'a>(
        &'a self,
        entity_id: &str,
        name: &str,
    ) -> impl Iterator<Item = (&'a KeyTuple, &'a StoredValue)> + 'a {
        self.entity_entries(entity_id, name)
            .into_iter()
            .flat_map(|entries| entries.iter())
    }

    /// Whether the entity has any entry under the attribute
    pub fn has_entries(&self, entity_id: &str, name: &str) -> bool {
        self.entity_entries(entity_id, name)
            .is_some_and(|entries| !entries.is_empty())
    }

    /// Entity ids holding at least one entry under the attribute
    pub fn entity_ids<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .get(name)
            .into_iter()
            .flat_map(|entities| entities.keys().map(String::as_str))
    }

    /// Number of entries stored under the attribute across all entities
    pub fn entry_count(&self, name: &str) -> usize {
        self.entries
            .get(name)
            .map_or(0, |entities| entities.values().map(BTreeMap::len).sum())
    }

    fn entity_entries(&self, entity_id: &str, name: &str) -> Option<&EntityEntries> {
        self.entries.get(name)?.get(entity_id)
    }
}

/// Validate a key tuple against a definition's dimensions
fn check_key(def: &AttributeDefinition, key: &[KeyPart]) -> Result<()> {
    if key.len() != def.arity() {
        return Err(AttributeError::ShapeMismatch {
            name: def.name().to_string(),
            expected: def.arity(),
            actual: key.len(),
        });
    }
    for (dimension, (part, expected)) in key.iter().zip(def.key_dims()).enumerate() {
        if part.kind() != *expected {
            return Err(AttributeError::KeyKindMismatch {
                name: def.name().to_string(),
                dimension,
                expected: *expected,
                actual: part.kind(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_store() -> ValueStore {
        let mut store = ValueStore::new();
        store.define("Scores", ValueKind::Integer, &[ValueKind::Integer]).unwrap();
        for (i, v) in [10, 20, 30].into_iter().enumerate() {
            store
                .set("n1", "Scores", vec![KeyPart::Integer(i as i32)], ScalarValue::Integer(v).into())
                .unwrap();
        }
        store
    }

    #[test]
    fn set_and_get_at_key() {
        let store = list_store();
        let v = store.get("n1", "Scores", &[KeyPart::Integer(1)]).unwrap();
        assert_eq!(v.as_scalar(), Some(&ScalarValue::Integer(20)));
        assert!(store.get("n2", "Scores", &[KeyPart::Integer(1)]).is_none());
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let mut store = list_store();
        let err = store
            .set("n1", "Scores", vec![], ScalarValue::Integer(1).into())
            .unwrap_err();
        assert_eq!(
            err,
            AttributeError::ShapeMismatch { name: "Scores".into(), expected: 1, actual: 0 }
        );
    }

    #[test]
    fn key_kind_is_checked() {
        let mut store = list_store();
        let err = store
            .set("n1", "Scores", vec![KeyPart::from("x")], ScalarValue::Integer(1).into())
            .unwrap_err();
        assert!(matches!(err, AttributeError::KeyKindMismatch { dimension: 0, .. }));
    }

    #[test]
    fn scalar_kind_is_checked() {
        let mut store = list_store();
        let err = store
            .set("n1", "Scores", vec![KeyPart::Integer(3)], ScalarValue::Float(1.0).into())
            .unwrap_err();
        assert!(matches!(err, AttributeError::TypeConflict { .. }));
    }

    #[test]
    fn writes_require_a_definition() {
        let mut store = ValueStore::new();
        let err = store
            .set("n1", "Missing", vec![], ScalarValue::Boolean(true).into())
            .unwrap_err();
        assert_eq!(err, AttributeError::UnknownAttribute { name: "Missing".into() });
    }

    #[test]
    fn remove_and_remove_all() {
        let mut store = list_store();
        assert!(store.remove("n1", "Scores", &[KeyPart::Integer(1)]));
        assert!(!store.remove("n1", "Scores", &[KeyPart::Integer(1)]));
        let keys: Vec<&KeyTuple> = store.keys_for("n1", "Scores").collect();
        assert_eq!(keys, vec![&vec![KeyPart::Integer(0)], &vec![KeyPart::Integer(2)]]);

        assert!(store.remove_all("n1", "Scores"));
        assert!(!store.remove_all("n1", "Scores"));
        assert!(!store.has_entries("n1", "Scores"));
        assert_eq!(store.entity_ids("Scores").count(), 0);
    }

    #[test]
    fn undefine_cascades() {
        let mut store = list_store();
        store
            .set("n2", "Scores", vec![KeyPart::Integer(0)], ScalarValue::Integer(1).into())
            .unwrap();
        assert_eq!(store.entry_count("Scores"), 4);

        assert!(store.undefine("Scores"));
        assert!(store.lookup("Scores").is_none());
        assert_eq!(store.entry_count("Scores"), 0);
        assert!(!store.undefine("Scores"));

        store.define("Scores", ValueKind::String, &[]).unwrap();
        assert!(!store.has_entries("n1", "Scores"));
    }
}
