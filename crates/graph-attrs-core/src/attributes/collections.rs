//! Simple list and simple map attributes
//!
//! Lists live under one integer key dimension at indices `0..n`, or as a single
//! formula at the sentinel index. Maps live under one string key dimension.
//! Both are rewritten wholesale on every set.

use std::collections::BTreeMap;

use crate::attributes::{check_shape, AttributeStore};
use crate::constants::LIST_FORMULA_INDEX;
use crate::formula::{coerce, EvalContext, FormulaValue};
use crate::types::{
    AttributeError, CoercionError, EvaluationError, KeyPart, Result, ScalarValue, ShapeKind,
    ValueKind,
};

impl AttributeStore {
    /// Replace an entity's list, defining the attribute on first write
    ///
    /// Elements must share one kind. Indices are rewritten densely from 0. An
    /// empty list clears an existing attribute and is a no-op otherwise.
    pub fn set_list_attribute<I, V>(&mut self, entity_id: &str, name: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        let values: Vec<ScalarValue> = values.into_iter().map(Into::into).collect();
        let Some(first) = values.first() else {
            return self.clear_collection(entity_id, name, ShapeKind::SimpleList);
        };
        let kind = first.kind();
        if let Some((index, value)) = values.iter().enumerate().find(|(_, v)| v.kind() != kind) {
            return Err(AttributeError::HeterogeneousList {
                name: name.to_string(),
                expected: kind,
                found: value.kind(),
                index,
            });
        }

        self.values.define(name, kind, &[ValueKind::Integer])?;
        self.values.remove_all(entity_id, name);
        for (index, value) in (0..=i32::MAX).zip(values) {
            self.values
                .set(entity_id, name, vec![KeyPart::Integer(index)], value.into())?;
        }
        Ok(())
    }

    /// Read an entity's list
    ///
    /// A list formula is evaluated and its elements mapped onto the attribute's
    /// kind. Otherwise indices are read from 0 until the first missing one, so
    /// a hole ends the list early. `None` if the entity has no entries.
    pub fn get_list_attribute(&self, entity_id: &str, name: &str) -> Result<Option<Vec<ScalarValue>>> {
        let Some(def) = self.values.lookup(name) else {
            return Ok(None);
        };
        check_shape(def, ShapeKind::SimpleList)?;

        let mut ctx = self.eval_context();
        match self.resolve_list(&mut ctx, entity_id, name, def.value_kind()) {
            Ok(list) => Ok(list),
            Err(error) => {
                self.record_failure(error);
                Ok(None)
            }
        }
    }

    /// Replace an entity's map, defining the attribute on first write
    ///
    /// Values must share one kind. An empty map clears an existing attribute
    /// and is a no-op otherwise.
    pub fn set_map_attribute<I, K, V>(&mut self, entity_id: &str, name: &str, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ScalarValue>,
    {
        let entries: BTreeMap<String, ScalarValue> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let Some(kind) = entries.values().next().map(ScalarValue::kind) else {
            return self.clear_collection(entity_id, name, ShapeKind::SimpleMap);
        };
        if let Some((key, value)) = entries.iter().find(|(_, v)| v.kind() != kind) {
            return Err(AttributeError::HeterogeneousMap {
                name: name.to_string(),
                expected: kind,
                found: value.kind(),
                key: key.clone(),
            });
        }

        self.values.define(name, kind, &[ValueKind::String])?;
        self.values.remove_all(entity_id, name);
        for (key, value) in entries {
            self.values
                .set(entity_id, name, vec![KeyPart::String(key)], value.into())?;
        }
        Ok(())
    }

    /// Read an entity's map; empty when the attribute or entity has none
    pub fn get_map_attribute(&self, entity_id: &str, name: &str) -> Result<BTreeMap<String, ScalarValue>> {
        let Some(def) = self.values.lookup(name) else {
            return Ok(BTreeMap::new());
        };
        check_shape(def, ShapeKind::SimpleMap)?;
        Ok(self.collect_map(entity_id, name))
    }

    /// Empty-collection write: clear when defined with the right shape
    fn clear_collection(&mut self, entity_id: &str, name: &str, shape: ShapeKind) -> Result<()> {
        if let Some(def) = self.values.lookup(name) {
            if def.shape() != shape {
                return Err(AttributeError::TypeConflict {
                    name: name.to_string(),
                    existing: def.to_string(),
                    attempted: shape.to_string(),
                });
            }
            self.values.remove_all(entity_id, name);
        }
        Ok(())
    }

    /// List contents for an entity, evaluating a list formula if present
    pub(super) fn resolve_list(
        &self,
        ctx: &mut EvalContext,
        entity_id: &str,
        name: &str,
        kind: ValueKind,
    ) -> std::result::Result<Option<Vec<ScalarValue>>, EvaluationError> {
        let sentinel = [KeyPart::Integer(LIST_FORMULA_INDEX)];
        if let Some(formula) = self
            .values
            .get(entity_id, name, &sentinel)
            .and_then(|v| v.as_formula())
        {
            let raw = self.evaluate_formula(ctx, entity_id, name, formula)?;
            let coerced: std::result::Result<Vec<ScalarValue>, CoercionError> = match &raw {
                FormulaValue::List(items) => items
                    .iter()
                    .map(|item| coerce::list_element(item, kind))
                    .collect(),
                other => Err(CoercionError::Unsupported {
                    found: other.type_name().to_string(),
                    target: kind,
                }),
            };
            return coerced.map(Some).map_err(|source| {
                ctx.abort();
                EvaluationError::Coercion {
                    name: name.to_string(),
                    target: kind,
                    source,
                }
            });
        }

        if !self.values.has_entries(entity_id, name) {
            return Ok(None);
        }
        let list = (0..=i32::MAX)
            .map_while(|index| {
                self.values
                    .get(entity_id, name, &[KeyPart::Integer(index)])
                    .and_then(|v| v.as_scalar())
                    .cloned()
            })
            .collect();
        Ok(Some(list))
    }

    /// Map contents for an entity
    pub(super) fn collect_map(&self, entity_id: &str, name: &str) -> BTreeMap<String, ScalarValue> {
        self.values
            .entries_for(entity_id, name)
            .filter_map(|(key, value)| match (key.as_slice(), value.as_scalar()) {
                ([KeyPart::String(k)], Some(v)) => Some((k.clone(), v.clone())),
                _ => None,
            })
            .collect()
    }
}
