//! Error types for the Sift framework.

use thiserror::Error;

/// Errors that can occur during context extraction.
///
/// A failed extraction skips the handler that asked for the value; it is
/// not reported any further.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The update has no field the extractor can read.
    #[error("update {update_id} has no {what}")]
    Missing {
        /// What the extractor looked for.
        what: &'static str,
        /// The update's id.
        update_id: i64,
    },

    /// No matcher has recorded a matched query yet.
    #[error("no filter query has matched this update")]
    NoMatchedQuery,

    /// Custom extraction error.
    #[error("{0}")]
    Custom(String),
}

impl ExtractError {
    /// Creates a custom extraction error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;
