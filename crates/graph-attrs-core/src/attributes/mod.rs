//! Typed accessor façade
//!
//! [`AttributeStore`] is the public read/write surface over the value store:
//! - the first write of an attribute locks in its kind and shape
//! - typed getters check the kind before touching storage
//! - formulas are evaluated on read and coerced to the attribute's kind
//!
//! Structural problems are returned as [`AttributeError`]. Evaluation failures
//! never are: the getter returns `Ok(None)` and the failure is kept as the
//! store's last error.

use ahash::AHashSet;
use parking_lot::Mutex;

use crate::core::config::StoreConfig;
use crate::formula::{EvalContext, FormulaExpr};
use crate::schema::AttributeDefinition;
use crate::storage::{StoredValue, ValueStore};
use crate::types::{
    AttributeError, DynamicValue, EvaluationError, KeyPart, Result, ScalarValue, ShapeKind,
    ValueKind,
};
use crate::constants::LIST_FORMULA_INDEX;
use crate::{log_debug, log_warn};

mod collections;
mod formulas;


pub use formulas::Recomputed;

/// Attribute store for one entity class
#[derive(Debug, Default)]
pub struct AttributeStore {
    values: ValueStore,
    /// Attributes hidden from users
    hidden: AHashSet<String>,
    /// Attributes users may not edit
    read_only: AHashSet<String>,
    last_error: Mutex<Option<EvaluationError>>,
    config: StoreConfig,
}

impl AttributeStore {
    /// Create an empty store with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given configuration
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ===== Scalars =====

    /// Set a scalar attribute, defining it on first write
    pub fn set_attribute(
        &mut self,
        entity_id: &str,
        name: &str,
        value: impl Into<ScalarValue>,
    ) -> Result<()> {
        let value = value.into();
        self.values.define(name, value.kind(), &[])?;
        self.values.set(entity_id, name, Vec::new(), value.into())
    }

    /// Read a boolean attribute
    pub fn get_boolean_attribute(&self, entity_id: &str, name: &str) -> Result<Option<bool>> {
        Ok(self
            .read_scalar(entity_id, name, ValueKind::Boolean)?
            .and_then(|v| v.as_boolean()))
    }

    /// Read an integer attribute
    pub fn get_integer_attribute(&self, entity_id: &str, name: &str) -> Result<Option<i32>> {
        Ok(self
            .read_scalar(entity_id, name, ValueKind::Integer)?
            .and_then(|v| v.as_integer()))
    }

    /// Read a float attribute
    pub fn get_float_attribute(&self, entity_id: &str, name: &str) -> Result<Option<f64>> {
        Ok(self
            .read_scalar(entity_id, name, ValueKind::Float)?
            .and_then(|v| v.as_float()))
    }

    /// Read a string attribute
    pub fn get_string_attribute(&self, entity_id: &str, name: &str) -> Result<Option<String>> {
        Ok(self
            .read_scalar(entity_id, name, ValueKind::String)?
            .and_then(ScalarValue::into_string))
    }

    /// Read any attribute, dispatching on its shape
    ///
    /// Convenience only: complex and undefined attributes come back absent,
    /// and evaluation failures are recorded as the last error.
    pub fn get_attribute(&self, entity_id: &str, name: &str) -> DynamicValue {
        let Some(def) = self.values.lookup(name) else {
            return DynamicValue::Absent;
        };
        let kind = def.value_kind();
        let mut ctx = self.eval_context();
        let result = match def.shape() {
            ShapeKind::Scalar => self
                .scalar_at(&mut ctx, entity_id, name, kind)
                .map(|v| v.map_or(DynamicValue::Absent, DynamicValue::Scalar)),
            ShapeKind::SimpleList => self
                .resolve_list(&mut ctx, entity_id, name, kind)
                .map(|v| v.map_or(DynamicValue::Absent, DynamicValue::List)),
            ShapeKind::SimpleMap => Ok(DynamicValue::Map(self.collect_map(entity_id, name))),
            ShapeKind::Complex | ShapeKind::Undefined => Ok(DynamicValue::Absent),
        };
        result.unwrap_or_else(|error| {
            self.record_failure(error);
            DynamicValue::Absent
        })
    }

    /// Kind and shape checks shared by the typed scalar getters
    fn read_scalar(
        &self,
        entity_id: &str,
        name: &str,
        requested: ValueKind,
    ) -> Result<Option<ScalarValue>> {
        let Some(def) = self.values.lookup(name) else {
            return Ok(None);
        };
        if def.value_kind() != requested {
            return Err(AttributeError::WrongType {
                name: name.to_string(),
                actual: def.value_kind(),
                requested,
            });
        }
        check_shape(def, ShapeKind::Scalar)?;

        let mut ctx = self.eval_context();
        match self.scalar_at(&mut ctx, entity_id, name, requested) {
            Ok(value) => Ok(value),
            Err(error) => {
                self.record_failure(error);
                Ok(None)
            }
        }
    }

    // ===== Deletion =====

    /// Remove one entity's entries for an attribute; the definition stays
    pub fn delete_entity_attribute(&mut self, entity_id: &str, name: &str) -> bool {
        let removed = self.values.remove_all(entity_id, name);
        if removed {
            log_debug!("Deleted attribute '{}' from entity '{}'", name, entity_id);
        }
        removed
    }

    /// Remove an attribute everywhere, releasing its kind and shape
    pub fn delete_attribute(&mut self, name: &str) -> bool {
        self.hidden.remove(name);
        self.read_only.remove(name);
        self.values.undefine(name)
    }

    // ===== Flags =====

    /// Show or hide an attribute in user interfaces
    pub fn set_user_visible(&mut self, name: &str, visible: bool) {
        if visible {
            self.hidden.remove(name);
        } else {
            self.hidden.insert(name.to_string());
        }
    }

    /// Whether the attribute is shown to users (default true)
    pub fn is_user_visible(&self, name: &str) -> bool {
        !self.hidden.contains(name)
    }

    /// Allow or forbid user edits of an attribute
    pub fn set_user_editable(&mut self, name: &str, editable: bool) {
        if editable {
            self.read_only.remove(name);
        } else {
            self.read_only.insert(name.to_string());
        }
    }

    /// Whether users may edit the attribute (default true)
    pub fn is_user_editable(&self, name: &str) -> bool {
        !self.read_only.contains(name)
    }

    // ===== Introspection =====

    /// All defined attribute names, sorted
    pub fn attribute_names(&self) -> Vec<&str> {
        self.values.registry().names()
    }

    /// Number of defined attributes
    pub fn attribute_count(&self) -> usize {
        self.values.registry().len()
    }

    /// Shape of an attribute, `Undefined` if it was never written
    pub fn shape_kind(&self, name: &str) -> ShapeKind {
        self.values
            .lookup(name)
            .map_or(ShapeKind::Undefined, AttributeDefinition::shape)
    }

    /// Value kind of an attribute
    pub fn value_kind(&self, name: &str) -> Option<ValueKind> {
        self.values.lookup(name).map(AttributeDefinition::value_kind)
    }

    /// Full definition of an attribute
    pub fn definition(&self, name: &str) -> Option<&AttributeDefinition> {
        self.values.lookup(name)
    }

    /// Entities holding a value for the attribute, sorted
    pub fn entity_ids(&self, name: &str) -> Vec<&str> {
        let mut ids: Vec<&str> = self.values.entity_ids(name).collect();
        ids.sort_unstable();
        ids
    }

    /// Whether the entity holds any value for the attribute
    pub fn has_attribute(&self, entity_id: &str, name: &str) -> bool {
        self.values.has_entries(entity_id, name)
    }

    /// Whether the entity's value for the attribute is a formula
    pub fn is_formula(&self, entity_id: &str, name: &str) -> bool {
        self.formula(entity_id, name).is_some()
    }

    /// Formula stored for the entity, for scalar or list attributes
    pub fn formula(&self, entity_id: &str, name: &str) -> Option<&FormulaExpr> {
        let key: &[KeyPart] = match self.shape_kind(name) {
            ShapeKind::Scalar => &[],
            ShapeKind::SimpleList => &[KeyPart::Integer(LIST_FORMULA_INDEX)],
            _ => return None,
        };
        self.values.get(entity_id, name, key)?.as_formula()
    }

    // ===== Last error =====

    /// Most recent evaluation failure
    pub fn last_error(&self) -> Option<EvaluationError> {
        self.last_error.lock().clone()
    }

    /// Message of the most recent evaluation failure
    pub fn last_error_message(&self) -> Option<String> {
        self.last_error.lock().as_ref().map(ToString::to_string)
    }

    /// Forget the most recent evaluation failure
    pub fn clear_last_error(&self) {
        *self.last_error.lock() = None;
    }

    fn record_failure(&self, error: EvaluationError) {
        if self.config.warn_on_evaluation_failure {
            log_warn!("{}", error);
        } else {
            log_debug!("{}", error);
        }
        *self.last_error.lock() = Some(error);
    }

    // ===== Low-level access =====

    /// Underlying value store
    pub fn value_store(&self) -> &ValueStore {
        &self.values
    }

    /// Mutable access to the underlying value store
    ///
    /// Writes made here skip the façade's lock-in and homogeneity checks.
    pub fn value_store_mut(&mut self) -> &mut ValueStore {
        &mut self.values
    }

    fn eval_context(&self) -> EvalContext {
        EvalContext::new(self.config.max_evaluation_depth)
    }
}

fn check_shape(def: &AttributeDefinition, requested: ShapeKind) -> Result<()> {
    if def.shape() != requested {
        return Err(AttributeError::WrongShape {
            name: def.name().to_string(),
            actual: def.shape(),
            requested,
        });
    }
    Ok(())
}
