//! Core logging and configuration

/// Store configuration
pub mod config;

/// Logging macros over `tracing`
pub mod logging;

// Re-export commonly used items
pub use config::StoreConfig;
