//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error - invalid value
    #[error("{section} has invalid {field}: {message}")]
    InvalidValue {
        /// Config section (e.g., "analytics")
        section: &'static str,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },

    /// Validation error - prefix listed twice in the metric defaults
    #[error("metric default prefix '{prefix}' is listed more than once")]
    DuplicatePrefix {
        /// The repeated prefix
        prefix: String,
    },
}

impl ConfigError {
    /// Create an InvalidValue error
    pub fn invalid_value(
        section: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            section,
            field,
            message: message.into(),
        }
    }

    /// Create a DuplicatePrefix error
    pub fn duplicate_prefix(prefix: impl Into<String>) -> Self {
        Self::DuplicatePrefix {
            prefix: prefix.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value("analytics", "table", "must not be empty");
        assert!(err.to_string().contains("analytics"));
        assert!(err.to_string().contains("table"));
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_duplicate_prefix_error() {
        let err = ConfigError::duplicate_prefix("llm.");
        assert!(err.to_string().contains("'llm.'"));
    }

    #[test]
    fn test_io_error_names_path() {
        let err = ConfigError::IoError {
            path: "missing.toml".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("missing.toml"));
    }
}
