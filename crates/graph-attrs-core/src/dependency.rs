//! Dependency ordering of formula attributes
//!
//! Walks formula references depth-first from one or more starting attributes
//! and sorts the resulting graph so every attribute comes after the attributes
//! it reads. Plain values are leaves. A cycle is reported as
//! [`OrderingError::Cycle`], separately from the runtime
//! [`EvaluationError::RecursiveEvaluation`](crate::types::EvaluationError).

use indexmap::{IndexMap, IndexSet};

use crate::attributes::AttributeStore;
use crate::types::OrderingError;
use crate::log_debug;

/// Attribute dependency graph for one entity
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// attribute → attributes its formula references
    dependencies: IndexMap<String, IndexSet<String>>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the transitive references of `roots` on one entity
    pub fn build(store: &AttributeStore, entity_id: &str, roots: &[&str]) -> Self {
        let mut graph = Self::new();
        let mut stack: Vec<String> = roots.iter().rev().map(|name| name.to_string()).collect();

        while let Some(name) = stack.pop() {
            if graph.contains(&name) {
                continue;
            }
            graph.add_node(&name);
            let Some(formula) = store.formula(entity_id, &name) else {
                continue;
            };
            let references: Vec<&str> = formula.attribute_references().collect();
            for reference in references.iter().rev() {
                graph.add_dependency(&name, reference);
                if !graph.contains(reference) {
                    stack.push(reference.to_string());
                }
            }
        }

        log_debug!(
            "Built dependency graph for '{}' from {:?}: {} attributes",
            entity_id,
            roots,
            graph.len()
        );
        graph
    }

    /// Add an attribute with no dependencies yet
    pub fn add_node(&mut self, name: &str) {
        self.dependencies.entry(name.to_string()).or_default();
    }

    /// Record that `name` reads `dependency`
    pub fn add_dependency(&mut self, name: &str, dependency: &str) {
        self.add_node(dependency);
        self.dependencies
            .entry(name.to_string())
            .or_default()
            .insert(dependency.to_string());
    }

    /// Whether the attribute is in the graph
    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Number of attributes in the graph
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Whether the graph is empty
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Group attributes into levels using Kahn's algorithm
    ///
    /// Level 0 holds attributes with no dependencies; each later level only
    /// depends on earlier ones. Names inside a level are sorted.
    pub fn levels(&self) -> Result<Vec<Vec<String>>, OrderingError> {
        let mut in_degree: IndexMap<&str, usize> = IndexMap::new();
        let mut dependents: IndexMap<&str, Vec<&str>> = IndexMap::new();

        for (name, deps) in &self.dependencies {
            in_degree.insert(name.as_str(), deps.len());
            for dep in deps {
                dependents.entry(dep.as_str()).or_default().push(name.as_str());
            }
        }

        let mut levels = Vec::new();
        let mut current: Vec<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut processed = 0;

        while !current.is_empty() {
            // Sort for determinism
            current.sort_unstable();
            processed += current.len();

            let mut next = Vec::new();
            for name in &current {
                for dependent in dependents.get(name).into_iter().flatten() {
                    if let Some(degree) = in_degree.get_mut(dependent) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(*dependent);
                        }
                    }
                }
            }

            levels.push(current.iter().map(|name| name.to_string()).collect());
            current = next;
        }

        if processed != self.dependencies.len() {
            let mut involved: Vec<String> = in_degree
                .iter()
                .filter(|(_, degree)| **degree > 0)
                .map(|(name, _)| name.to_string())
                .collect();
            involved.sort_unstable();
            return Err(OrderingError::Cycle { involved });
        }

        Ok(levels)
    }

    /// Flattened evaluation order, dependencies first
    pub fn topological_order(&self) -> Result<Vec<String>, OrderingError> {
        Ok(self.levels()?.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (name, dep) in edges {
            graph.add_dependency(name, dep);
        }
        graph
    }

    #[test]
    fn dependencies_come_first() {
        let graph = graph(&[("Total", "A1"), ("Total", "A2"), ("A2", "Base")]);
        let levels = graph.levels().unwrap();
        assert_eq!(
            levels,
            vec![
                vec!["A1".to_string(), "Base".to_string()],
                vec!["A2".to_string()],
                vec!["Total".to_string()],
            ]
        );
        assert_eq!(graph.topological_order().unwrap(), vec!["A1", "Base", "A2", "Total"]);
    }

    #[test]
    fn cycle_lists_involved_attributes() {
        let graph = graph(&[("A", "B"), ("B", "A"), ("C", "A"), ("B", "D")]);
        let err = graph.topological_order().unwrap_err();
        assert_eq!(
            err,
            OrderingError::Cycle { involved: vec!["A".into(), "B".into(), "C".into()] }
        );
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let graph = graph(&[("A", "A")]);
        assert!(graph.levels().is_err());
    }

    #[test]
    fn empty_graph() {
        let graph = DependencyGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.topological_order().unwrap(), Vec::<String>::new());
    }
}
