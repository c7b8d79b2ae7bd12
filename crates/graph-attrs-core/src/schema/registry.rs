use ahash::AHashMap;

use crate::schema::definition::{signature, AttributeDefinition};
use crate::types::{AttributeError, DimKind, Result, ValueKind};
use crate::log_debug;

/// Registry of attribute definitions for one store
///
/// Holds definitions only; entry cleanup on removal is the value store's job.
#[derive(Debug, Default, Clone)]
pub struct DefinitionRegistry {
    definitions: AHashMap<String, AttributeDefinition>,
}

impl DefinitionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Define an attribute, or confirm an identical existing definition
    pub fn define(
        &mut self,
        name: &str,
        value_kind: ValueKind,
        key_dims: &[DimKind],
    ) -> Result<&AttributeDefinition> {
        if !self.definitions.contains_key(name) {
            log_debug!("Defining attribute '{}' as {}", name, signature(value_kind, key_dims));
            self.definitions.insert(
                name.to_string(),
                AttributeDefinition::new(name, value_kind, key_dims.to_vec()),
            );
        }
        let existing = &self.definitions[name];
        if !existing.matches(value_kind, key_dims) {
            return Err(AttributeError::TypeConflict {
                name: name.to_string(),
                existing: existing.to_string(),
                attempted: signature(value_kind, key_dims),
            });
        }
        Ok(existing)
    }

    /// Look up a definition by name
    pub fn lookup(&self, name: &str) -> Option<&AttributeDefinition> {
        self.definitions.get(name)
    }

    /// Remove a definition, returning it if it existed
    pub fn remove(&mut self, name: &str) -> Option<AttributeDefinition> {
        self.definitions.remove(name)
    }

    /// Check if a definition exists
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// All defined attribute names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether no attribute is defined
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShapeKind;

    #[test]
    fn define_is_idempotent_for_identical_signatures() {
        let mut registry = DefinitionRegistry::new();
        registry.define("Rank", ValueKind::Integer, &[]).unwrap();
        let def = registry.define("Rank", ValueKind::Integer, &[]).unwrap();
        assert_eq!(def.shape(), ShapeKind::Scalar);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn conflicting_definition_is_rejected() {
        let mut registry = DefinitionRegistry::new();
        registry.define("Scores", ValueKind::Integer, &[ValueKind::Integer]).unwrap();

        let err = registry.define("Scores", ValueKind::Integer, &[]).unwrap_err();
        assert_eq!(
            err,
            AttributeError::TypeConflict {
                name: "Scores".into(),
                existing: "Integer[Integer]".into(),
                attempted: "Integer".into(),
            }
        );
        assert_eq!(registry.lookup("Scores").unwrap().arity(), 1);
    }

    #[test]
    fn remove_permits_redefinition() {
        let mut registry = DefinitionRegistry::new();
        registry.define("Label", ValueKind::String, &[]).unwrap();
        assert!(registry.remove("Label").is_some());
        assert!(registry.remove("Label").is_none());
        registry.define("Label", ValueKind::Float, &[]).unwrap();
        assert_eq!(registry.lookup("Label").unwrap().value_kind(), ValueKind::Float);
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = DefinitionRegistry::new();
        for name in ["b", "c", "a"] {
            registry.define(name, ValueKind::Boolean, &[]).unwrap();
        }
        assert_eq!(registry.names(), vec!["a", "b", "c"]);
    }
}
