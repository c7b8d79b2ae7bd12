//! Formula check
//!
//! Recomputes every formula attribute of every entity in dependency order and
//! collects the outcomes into a report.

use std::collections::BTreeSet;
use std::fmt;

use graph_attrs_core::{AttributeStore, DynamicValue, EvaluationError, OrderingError};
use tracing::{info, warn};

use crate::context::{AppContext, EntityClass};

/// One line of a check report
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    /// A formula evaluated successfully
    Value {
        /// Entity class
        class: EntityClass,
        /// Entity id
        entity: String,
        /// Attribute name
        attribute: String,
        /// Coerced value
        value: DynamicValue,
    },
    /// A formula failed to evaluate
    Failed {
        /// Entity class
        class: EntityClass,
        /// Entity id
        entity: String,
        /// Attribute name
        attribute: String,
        /// Why evaluation failed
        error: EvaluationError,
    },
    /// The entity's formulas reference each other in a cycle
    Cycle {
        /// Entity class
        class: EntityClass,
        /// Entity id
        entity: String,
        /// Attributes in the cycle
        error: OrderingError,
    },
}

impl Finding {
    /// Whether this finding is a failure
    pub fn is_failure(&self) -> bool {
        !matches!(self, Finding::Value { .. })
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::Value { class, entity, attribute, value } => {
                write!(f, "ok     {} {} {} = {}", class, entity, attribute, value)
            }
            Finding::Failed { class, entity, attribute, error } => {
                write!(f, "FAILED {} {} {}: {}", class, entity, attribute, error)
            }
            Finding::Cycle { class, entity, error } => {
                write!(f, "CYCLE  {} {}: {}", class, entity, error)
            }
        }
    }
}

/// Outcome of checking every store in a context
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    /// Findings in class, entity and evaluation order
    pub findings: Vec<Finding>,
}

impl CheckReport {
    /// Number of failed formulas and cycles
    pub fn failure_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_failure()).count()
    }

    /// Whether every formula evaluated
    pub fn is_clean(&self) -> bool {
        self.failure_count() == 0
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finding in &self.findings {
            writeln!(f, "{}", finding)?;
        }
        write!(
            f,
            "{} formulas checked, {} failures",
            self.findings.len(),
            self.failure_count()
        )
    }
}

/// Check every formula in every store
pub fn run(context: &AppContext) -> CheckReport {
    let mut report = CheckReport::default();
    for class in EntityClass::ALL {
        let store = context.store(class).read();
        check_store(class, &store, &mut report);
    }

    if report.is_clean() {
        info!("Check passed: {} formulas", report.findings.len());
    } else {
        warn!("Check found {} failures", report.failure_count());
    }
    report
}

fn check_store(class: EntityClass, store: &AttributeStore, report: &mut CheckReport) {
    let entities: BTreeSet<&str> = store
        .attribute_names()
        .into_iter()
        .flat_map(|name| store.entity_ids(name))
        .collect();

    for entity in entities {
        match store.recompute(entity) {
            Ok(results) => {
                report.findings.extend(results.into_iter().map(|r| match r.outcome {
                    Ok(value) => Finding::Value {
                        class,
                        entity: entity.to_string(),
                        attribute: r.name,
                        value,
                    },
                    Err(error) => Finding::Failed {
                        class,
                        entity: entity.to_string(),
                        attribute: r.name,
                        error,
                    },
                }));
            }
            Err(error) => report.findings.push(Finding::Cycle {
                class,
                entity: entity.to_string(),
                error,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_attrs_core::{Expr, ValueKind};

    #[test]
    fn clean_context_reports_values() {
        let context = AppContext::default();
        {
            let mut nodes = context.nodes.write();
            nodes.set_attribute("e1", "A1", 2).unwrap();
            nodes.set_attribute("e1", "A2", 3.5).unwrap();
            nodes
                .set_formula_attribute(
                    "e1",
                    "Total",
                    Expr::attr("A1", ValueKind::Integer) + Expr::attr("A2", ValueKind::Float),
                )
                .unwrap();
        }

        let report = run(&context);
        assert!(report.is_clean());
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].to_string(), "ok     node e1 Total = 5.5");
    }

    #[test]
    fn failures_and_cycles_are_counted() {
        let context = AppContext::default();
        {
            let mut edges = context.edges.write();
            edges.set_formula_attribute("x", "A", Expr::attr("B", ValueKind::Integer)).unwrap();
            edges.set_formula_attribute("x", "B", Expr::attr("A", ValueKind::Integer)).unwrap();
            edges
                .set_formula_attribute("y", "Missing", Expr::attr("Nowhere", ValueKind::Float))
                .unwrap();
        }

        let report = run(&context);
        assert_eq!(report.failure_count(), 2);
        assert!(matches!(report.findings[0], Finding::Cycle { ref entity, .. } if entity == "x"));
        assert!(matches!(report.findings[1], Finding::Failed { ref attribute, .. } if attribute == "Missing"));
        assert!(report.to_string().ends_with("2 formulas checked, 2 failures"));
    }
}
