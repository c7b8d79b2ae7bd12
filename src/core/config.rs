//! Configuration management for graph-attrs
//!
//! Settings come from `graph-attrs.toml` when present, then `GA_*` environment
//! variables, then command-line flags applied by the binary.

use std::path::Path;

use graph_attrs_core::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// Default configuration file looked up by [`AppConfig::load`]
pub const DEFAULT_CONFIG_FILE: &str = "graph-attrs.toml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Settings shared by every attribute store
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_level")]
    pub level: String,

    /// Log format (pretty, compact, json)
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_level() -> String { "info".to_string() }
fn default_format() -> String { "pretty".to_string() }

impl AppConfig {
    /// Load configuration from the default file and environment variables
    pub fn load() -> Result<Self> {
        let mut config = if Path::new(DEFAULT_CONFIG_FILE).exists() {
            Self::from_file(DEFAULT_CONFIG_FILE)?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply `GA_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(level) = lookup("GA_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = lookup("GA_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Some(depth) = lookup("GA_MAX_EVAL_DEPTH") {
            self.store.max_evaluation_depth = depth
                .parse()
                .map_err(|e| Error::config(format!("Invalid max evaluation depth: {}", e)))?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(Error::config(format!(
                "Invalid log level: {}. Valid options: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(Error::config(format!(
                "Invalid log format: {}. Valid options: {}",
                self.logging.format,
                LOG_FORMATS.join(", ")
            )));
        }

        if self.store.max_evaluation_depth == 0 {
            return Err(Error::config("Max evaluation depth must be at least 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.store.max_evaluation_depth, 64);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nformat = \"json\"").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn overrides_apply_and_are_checked() {
        let vars: HashMap<&str, &str> =
            [("GA_LOG_LEVEL", "debug"), ("GA_MAX_EVAL_DEPTH", "8")].into_iter().collect();
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.store.max_evaluation_depth, 8);

        let err = config
            .apply_overrides(|key| (key == "GA_MAX_EVAL_DEPTH").then(|| "deep".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.format = "xml".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.store.max_evaluation_depth = 0;
        assert!(config.validate().is_err());
    }
}
