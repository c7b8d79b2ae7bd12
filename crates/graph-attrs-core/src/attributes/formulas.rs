//! Formula attributes
//!
//! Storing formulas, evaluating them on read, and ordering them for batch
//! recomputation.

use crate::attributes::AttributeStore;
use crate::constants::LIST_FORMULA_INDEX;
use crate::dependency::DependencyGraph;
use crate::formula::{coerce, Bindings, EvalContext, FormulaExpr, FormulaType, FormulaValue};
use crate::storage::StoredValue;
use crate::types::{
    AttributeError, DynamicValue, EvaluationError, KeyPart, OrderingError, Result, ScalarValue,
    ShapeKind, ValueKind,
};
use crate::log_trace;

type EvalResult<T> = std::result::Result<T, EvaluationError>;

/// Outcome of recomputing one formula attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Recomputed {
    /// Attribute name
    pub name: String,
    /// Coerced value, or why evaluation failed
    pub outcome: EvalResult<DynamicValue>,
}

impl AttributeStore {
    /// Store a formula for an entity
    ///
    /// An undefined attribute is defined from the formula's return type. A
    /// scalar formula replaces the entity's value; a list formula replaces the
    /// whole list and sits at the sentinel index. The return type must be
    /// compatible with the attribute or the call fails with
    /// [`AttributeError::IncompatibleEquation`].
    pub fn set_formula_attribute(
        &mut self,
        entity_id: &str,
        name: &str,
        formula: impl Into<FormulaExpr>,
    ) -> Result<()> {
        let formula = formula.into();
        let returns = formula.return_type();
        let def = match self.values.lookup(name) {
            Some(def) => def.clone(),
            None => match returns {
                FormulaType::Scalar(kind) => self.values.define(name, kind, &[])?.clone(),
                FormulaType::List(kind) => self.values.define(name, kind, &[ValueKind::Integer])?.clone(),
            },
        };
        if !returns.is_compatible_with(&def) {
            return Err(AttributeError::IncompatibleEquation {
                name: name.to_string(),
                definition: def.to_string(),
                returns,
            });
        }

        match returns {
            FormulaType::Scalar(_) => self.values.set(entity_id, name, Vec::new(), formula.into()),
            FormulaType::List(_) => {
                self.values.remove_all(entity_id, name);
                self.values.set(
                    entity_id,
                    name,
                    vec![KeyPart::Integer(LIST_FORMULA_INDEX)],
                    formula.into(),
                )
            }
        }
    }

    /// Evaluation order for one attribute on one entity
    ///
    /// Every attribute appears after the attributes its formula reads; the
    /// requested attribute comes last.
    pub fn evaluation_order(&self, entity_id: &str, name: &str) -> std::result::Result<Vec<String>, OrderingError> {
        self.evaluation_order_for(entity_id, &[name])
    }

    /// Evaluation order over the combined references of several attributes
    pub fn evaluation_order_for(
        &self,
        entity_id: &str,
        names: &[&str],
    ) -> std::result::Result<Vec<String>, OrderingError> {
        DependencyGraph::build(self, entity_id, names).topological_order()
    }

    /// Evaluate every formula attribute on an entity in dependency order
    ///
    /// A dependency cycle fails the whole batch before anything is evaluated.
    /// Individual evaluation failures are reported per attribute.
    pub fn recompute(&self, entity_id: &str) -> std::result::Result<Vec<Recomputed>, OrderingError> {
        let roots: Vec<&str> = self
            .attribute_names()
            .into_iter()
            .filter(|name| self.is_formula(entity_id, name))
            .collect();
        let order = self.evaluation_order_for(entity_id, &roots)?;

        let results = order
            .into_iter()
            .filter(|name| self.is_formula(entity_id, name))
            .map(|name| {
                let outcome = self.evaluate_dynamic(entity_id, &name);
                Recomputed { name, outcome }
            })
            .collect();
        Ok(results)
    }

    fn evaluate_dynamic(&self, entity_id: &str, name: &str) -> EvalResult<DynamicValue> {
        let Some(def) = self.values.lookup(name) else {
            return Ok(DynamicValue::Absent);
        };
        let kind = def.value_kind();
        let mut ctx = self.eval_context();
        Ok(match def.shape() {
            ShapeKind::Scalar => self
                .scalar_at(&mut ctx, entity_id, name, kind)?
                .map_or(DynamicValue::Absent, DynamicValue::Scalar),
            ShapeKind::SimpleList => self
                .resolve_list(&mut ctx, entity_id, name, kind)?
                .map_or(DynamicValue::Absent, DynamicValue::List),
            _ => DynamicValue::Absent,
        })
    }

    /// Scalar value for an entity, evaluating and coercing a formula
    pub(super) fn scalar_at(
        &self,
        ctx: &mut EvalContext,
        entity_id: &str,
        name: &str,
        kind: ValueKind,
    ) -> EvalResult<Option<ScalarValue>> {
        match self.values.get(entity_id, name, &[]) {
            None => Ok(None),
            Some(StoredValue::Scalar(value)) => Ok(Some(value.clone())),
            Some(StoredValue::Formula(formula)) => {
                let raw = self.evaluate_formula(ctx, entity_id, name, formula)?;
                coerce::to_kind(&raw, kind).map(Some).map_err(|source| {
                    ctx.abort();
                    EvaluationError::Coercion {
                        name: name.to_string(),
                        target: kind,
                        source,
                    }
                })
            }
        }
    }

    /// Run one formula: guard against cycles, bind references, evaluate
    ///
    /// Any failure clears the whole in-flight set.
    pub(super) fn evaluate_formula(
        &self,
        ctx: &mut EvalContext,
        entity_id: &str,
        name: &str,
        formula: &FormulaExpr,
    ) -> EvalResult<FormulaValue> {
        ctx.enter(name)?;
        log_trace!("Evaluating '{}' on '{}' (depth {})", name, entity_id, ctx.depth());

        let result = self
            .resolve_references(ctx, entity_id, name, formula)
            .and_then(|bindings| {
                formula
                    .evaluate(&bindings)
                    .map_err(|message| EvaluationError::Evaluation {
                        name: name.to_string(),
                        message,
                    })
            });

        match result {
            Ok(value) => {
                ctx.leave(name);
                log_trace!("'{}' on '{}' = {}", name, entity_id, value);
                Ok(value)
            }
            Err(error) => {
                ctx.abort();
                Err(error)
            }
        }
    }

    fn resolve_references(
        &self,
        ctx: &mut EvalContext,
        entity_id: &str,
        name: &str,
        formula: &FormulaExpr,
    ) -> EvalResult<Bindings> {
        let mut bindings = Bindings::new(entity_id);
        for reference in formula.attribute_references() {
            let value = self.resolve_reference(ctx, entity_id, reference)?.ok_or_else(|| {
                EvaluationError::MissingReference {
                    name: name.to_string(),
                    reference: reference.to_string(),
                    entity: entity_id.to_string(),
                }
            })?;
            bindings.insert(reference, value);
        }
        Ok(bindings)
    }

    /// Bind one referenced attribute by its shape
    fn resolve_reference(
        &self,
        ctx: &mut EvalContext,
        entity_id: &str,
        reference: &str,
    ) -> EvalResult<Option<FormulaValue>> {
        let Some(def) = self.values.lookup(reference) else {
            return Ok(None);
        };
        let kind = def.value_kind();
        match def.shape() {
            ShapeKind::Scalar => Ok(self
                .scalar_at(ctx, entity_id, reference, kind)?
                .map(FormulaValue::from)),
            ShapeKind::SimpleList => Ok(self
                .resolve_list(ctx, entity_id, reference, kind)?
                .map(|items| FormulaValue::List(items.into_iter().map(FormulaValue::from).collect()))),
            ShapeKind::SimpleMap => {
                let entries = self.collect_map(entity_id, reference);
                if entries.is_empty() {
                    return Ok(None);
                }
                Ok(Some(FormulaValue::Map(
                    entries
                        .into_iter()
                        .map(|(key, value)| (key, FormulaValue::from(value)))
                        .collect(),
                )))
            }
            ShapeKind::Complex | ShapeKind::Undefined => Ok(None),
        }
    }
}
