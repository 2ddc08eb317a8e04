//! Runtime error types.

use sift_core::{QueryError, UpdateError};
use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A query passed in code was malformed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// An incoming update was rejected.
    #[error("Rejected update: {0}")]
    Update(#[from] UpdateError),

    /// No route with this name is configured.
    #[error("Route not found: {0}")]
    UnknownRoute(String),

    /// Listening for the shutdown signal failed.
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
