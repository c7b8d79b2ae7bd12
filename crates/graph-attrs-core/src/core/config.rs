//! Configuration for an attribute store
//!
//! Settings that shape formula evaluation. Every field is optional when
//! deserialised, so partial config sections fall back to defaults.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_EVALUATION_DEPTH;

/// Attribute store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum nesting of formula evaluation before it is abandoned
    #[serde(default = "default_max_evaluation_depth")]
    pub max_evaluation_depth: usize,

    /// Log captured evaluation failures at warn level (debug otherwise)
    #[serde(default = "default_warn_on_evaluation_failure")]
    pub warn_on_evaluation_failure: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_evaluation_depth: default_max_evaluation_depth(),
            warn_on_evaluation_failure: default_warn_on_evaluation_failure(),
        }
    }
}

impl StoreConfig {
    /// Override the evaluation depth limit
    pub fn with_max_evaluation_depth(mut self, depth: usize) -> Self {
        self.max_evaluation_depth = depth;
        self
    }
}

// Default value functions for serde
fn default_max_evaluation_depth() -> usize { DEFAULT_MAX_EVALUATION_DEPTH }
fn default_warn_on_evaluation_failure() -> bool { true }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_section_falls_back_to_defaults() {
        let config: StoreConfig = toml::from_str("max_evaluation_depth = 8").unwrap();
        assert_eq!(config.max_evaluation_depth, 8);
        assert!(config.warn_on_evaluation_failure);

        let config: StoreConfig = toml::from_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn builder_overrides_depth() {
        let config = StoreConfig::default().with_max_evaluation_depth(3);
        assert_eq!(config.max_evaluation_depth, 3);
        assert!(config.warn_on_evaluation_failure);
    }
}
