//! Graph Attributes - typed attribute storage and formulas for graph entities
//!
//! Wraps the `graph_attrs_core` attribute store in an application: one store
//! per entity class, file and environment configuration, logging set-up, JSON
//! seed loading and a formula check.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;

// Main functional modules
pub mod context;
pub mod seed;
pub mod check;

use tracing_subscriber::EnvFilter;

// Re-export commonly used items for convenience
pub use crate::core::{AppConfig, Error, LoggingConfig, Result};
pub use context::{AppContext, EntityClass, SharedStore};
pub use graph_attrs_core as attrs;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize tracing from the logging configuration
///
/// `RUST_LOG` wins over the configured level when set. Logs go to stderr.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| Error::config(format!("Invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.format.as_str() {
        "json" => builder.json().try_init(),
        "compact" => builder.compact().try_init(),
        _ => builder.pretty().try_init(),
    };
    installed.map_err(|e| Error::config(format!("Failed to initialize logging: {}", e)))?;

    tracing::info!("Initializing {} v{}", NAME, VERSION);
    Ok(())
}
