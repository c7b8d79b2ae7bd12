//! Core application foundations
//!
//! Error handling and configuration for the graph-attrs application.

pub mod error;
pub mod config;

// Re-export commonly used items
pub use error::{Error, Result};
pub use config::{AppConfig, LoggingConfig};
