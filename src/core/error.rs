//! Error types for the graph-attrs application
//!
//! Store-level failures come from `graph_attrs_core` and are wrapped here next
//! to configuration, seed and I/O problems.

use graph_attrs_core::AttributeError;
use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Structural attribute errors (type lock-in, shapes, formulas)
    #[error("Attribute error: {0}")]
    Attribute(#[from] AttributeError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON seed parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_and_conversions() {
        let err = Error::config("bad level");
        assert_eq!(err.to_string(), "Configuration error: bad level");

        let err = Error::invalid_input("no seed");
        assert!(matches!(err, Error::InvalidInput(_)));

        let err: Error = AttributeError::UnknownAttribute { name: "x".into() }.into();
        assert_eq!(err.to_string(), "Attribute error: Attribute not defined: x");
    }
}
