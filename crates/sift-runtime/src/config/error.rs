//! Configuration error types.

use std::path::PathBuf;

use sift_core::QueryError;
use thiserror::Error;

use crate::logging::LoggingError;

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found at the specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The file extension has no enabled format feature.
    #[error("Unsupported or disabled configuration file format: .{0}")]
    UnsupportedFormat(String),

    /// The merged sources could not be extracted into the schema.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {message}")]
    ValidationError { message: String },

    /// Missing required field.
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// Two routes share a name.
    #[error("Duplicate route name: {0}")]
    DuplicateRoute(String),

    /// A route lists a malformed query.
    #[error("Invalid query in route '{route}': {source}")]
    InvalidQuery {
        route: String,
        #[source]
        source: QueryError,
    },

    /// The logging section could not be applied.
    #[error("Failed to set up logging: {0}")]
    Logging(#[from] LoggingError),
}

impl ConfigError {
    /// Creates a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid query error for a route.
    pub fn invalid_query(route: impl Into<String>, source: QueryError) -> Self {
        Self::InvalidQuery {
            route: route.into(),
            source,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
