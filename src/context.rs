//! Application context
//!
//! Holds one attribute store per entity class. Stores are independent: the same
//! attribute name can have a different kind on nodes and on edges.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use graph_attrs_core::AttributeStore;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::config::AppConfig;
use crate::core::error::Error;

/// Attribute store shared between collaborators
pub type SharedStore = Arc<RwLock<AttributeStore>>;

/// Kind of graph entity an attribute is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityClass {
    /// Graph nodes
    Node,
    /// Graph edges
    Edge,
    /// Whole networks
    Network,
}

impl EntityClass {
    /// All entity classes
    pub const ALL: [EntityClass; 3] = [EntityClass::Node, EntityClass::Edge, EntityClass::Network];

    /// Lowercase name of the class
    pub fn name(&self) -> &'static str {
        match self {
            EntityClass::Node => "node",
            EntityClass::Edge => "edge",
            EntityClass::Network => "network",
        }
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" | "nodes" => Ok(EntityClass::Node),
            "edge" | "edges" => Ok(EntityClass::Edge),
            "network" | "networks" => Ok(EntityClass::Network),
            other => Err(Error::invalid_input(format!(
                "Unknown entity class: {}. Valid options: node, edge, network",
                other
            ))),
        }
    }
}

/// Central application state holding the attribute stores
pub struct AppContext {
    /// Application configuration
    pub config: AppConfig,

    /// Node attributes
    pub nodes: SharedStore,

    /// Edge attributes
    pub edges: SharedStore,

    /// Network attributes
    pub networks: SharedStore,
}

impl AppContext {
    /// Create empty stores configured from `config`
    pub fn new(config: AppConfig) -> Self {
        let store = || Arc::new(RwLock::new(AttributeStore::with_config(config.store.clone())));
        let context = Self {
            nodes: store(),
            edges: store(),
            networks: store(),
            config,
        };
        info!(
            "Attribute stores ready (max evaluation depth {})",
            context.config.store.max_evaluation_depth
        );
        context
    }

    /// Store for one entity class
    pub fn store(&self, class: EntityClass) -> &SharedStore {
        match class {
            EntityClass::Node => &self.nodes,
            EntityClass::Edge => &self.edges,
            EntityClass::Network => &self.networks,
        }
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_are_independent() {
        let context = AppContext::default();
        context.store(EntityClass::Node).write().set_attribute("n1", "weight", 1).unwrap();
        context.store(EntityClass::Edge).write().set_attribute("e1", "weight", "heavy").unwrap();

        assert_eq!(context.nodes.read().get_integer_attribute("n1", "weight").unwrap(), Some(1));
        assert_eq!(
            context.edges.read().get_string_attribute("e1", "weight").unwrap(),
            Some("heavy".into())
        );
        assert_eq!(context.networks.read().attribute_count(), 0);
    }

    #[test]
    fn stores_share_configuration() {
        let mut config = AppConfig::default();
        config.store.max_evaluation_depth = 5;
        let context = AppContext::new(config);
        for class in EntityClass::ALL {
            assert_eq!(context.store(class).read().config().max_evaluation_depth, 5);
        }
    }

    #[test]
    fn class_names_parse() {
        assert_eq!("edges".parse::<EntityClass>().unwrap(), EntityClass::Edge);
        assert_eq!(EntityClass::Network.to_string(), "network");
        assert!("vertex".parse::<EntityClass>().is_err());
    }
}
