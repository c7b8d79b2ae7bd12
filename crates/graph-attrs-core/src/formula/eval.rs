//! Evaluation guard
//!
//! Tracks which attributes are being evaluated in one top-level read. A fresh
//! context is created for every public read, so evaluations running on
//! different entities never share cycle-detection state.

use indexmap::IndexSet;

use crate::types::EvaluationError;
use crate::log_trace;

/// In-flight state for one top-level evaluation
#[derive(Debug, Clone)]
pub struct EvalContext {
    active: IndexSet<String>,
    max_depth: usize,
}

impl EvalContext {
    /// Start an evaluation allowing at most `max_depth` nested formulas
    pub fn new(max_depth: usize) -> Self {
        Self {
            active: IndexSet::new(),
            max_depth,
        }
    }

    /// Mark an attribute as being evaluated
    ///
    /// Re-entering an active attribute is a cycle. Either failure abandons the
    /// whole evaluation, so the in-flight set is cleared.
    pub fn enter(&mut self, name: &str) -> Result<(), EvaluationError> {
        if self.active.contains(name) {
            log_trace!("Cycle through '{}' (path: {})", name, self.path().join(" -> "));
            self.abort();
            return Err(EvaluationError::RecursiveEvaluation { name: name.to_string() });
        }
        if self.active.len() >= self.max_depth {
            self.abort();
            return Err(EvaluationError::DepthLimitExceeded {
                name: name.to_string(),
                limit: self.max_depth,
            });
        }
        self.active.insert(name.to_string());
        Ok(())
    }

    /// Mark an attribute's evaluation as finished
    pub fn leave(&mut self, name: &str) {
        self.active.shift_remove(name);
    }

    /// Drop all in-flight state after a failure
    pub fn abort(&mut self) {
        self.active.clear();
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.active.len()
    }

    /// Whether an attribute is being evaluated
    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    /// Attributes currently being evaluated, outermost first
    pub fn path(&self) -> Vec<&str> {
        self.active.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reentry_is_a_cycle_and_clears_state() {
        let mut ctx = EvalContext::new(8);
        ctx.enter("A").unwrap();
        ctx.enter("B").unwrap();
        assert_eq!(ctx.path(), vec!["A", "B"]);

        let err = ctx.enter("A").unwrap_err();
        assert_eq!(err, EvaluationError::RecursiveEvaluation { name: "A".into() });
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn leave_allows_sibling_reuse() {
        let mut ctx = EvalContext::new(8);
        ctx.enter("Total").unwrap();
        ctx.enter("A1").unwrap();
        ctx.leave("A1");
        ctx.enter("A1").unwrap();
        assert!(ctx.is_active("Total"));
    }

    #[test]
    fn depth_limit() {
        let mut ctx = EvalContext::new(2);
        ctx.enter("a").unwrap();
        ctx.enter("b").unwrap();
        assert_eq!(
            ctx.enter("c"),
            Err(EvaluationError::DepthLimitExceeded { name: "c".into(), limit: 2 })
        );
        assert_eq!(ctx.depth(), 0);
    }
}
