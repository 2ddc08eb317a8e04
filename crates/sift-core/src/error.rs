//! Error types for the Sift core.
//!
//! Only two things can go wrong here: a filter query is malformed (caught when
//! the query is registered, never while matching), or raw update data cannot
//! be turned into an [`Update`](crate::Update). A query that simply does not
//! match an update is not an error and has no representation in this module.

use thiserror::Error;

// =============================================================================
// Query Errors
// =============================================================================

/// Configuration errors raised while parsing or registering filter queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The query string is empty.
    #[error("filter query is empty")]
    Empty,

    /// One of the colon-separated segments is empty (`"message:"`, `"::"`).
    #[error("filter query '{query}' has an empty segment at position {position}")]
    EmptySegment {
        /// The offending query.
        query: String,
        /// Zero-based index of the empty segment.
        position: usize,
    },

    /// More than three segments were given.
    #[error("filter query '{query}' has {depth} segments, at most {max} are allowed")]
    TooDeep {
        /// The offending query.
        query: String,
        /// Number of segments found.
        depth: usize,
        /// Maximum number of segments.
        max: usize,
    },

    /// The first segment does not name an update kind.
    #[error("filter query '{query}' has unknown discriminator '{discriminator}'")]
    UnknownDiscriminator {
        /// The offending query.
        query: String,
        /// The first segment of the query.
        discriminator: String,
    },

    /// A query list contained no queries at all.
    #[error("filter needs at least one query")]
    NoQueries,
}

// =============================================================================
// Update Errors
// =============================================================================

/// Errors raised while reading or checking an [`Update`](crate::Update).
#[derive(Debug, Clone, Error)]
pub enum UpdateError {
    /// The raw data could not be deserialized.
    #[error("failed to parse update: {reason}")]
    Parse {
        /// Reason for failure.
        reason: String,
    },

    /// No variant field is present.
    #[error("update {update_id} carries no known variant")]
    NoVariant {
        /// The update's id.
        update_id: i64,
    },

    /// More than one variant field is present.
    #[error("update {update_id} carries {count} variants, expected exactly one")]
    MultipleVariants {
        /// The update's id.
        update_id: i64,
        /// Number of present variants.
        count: usize,
    },
}

impl From<serde_json::Error> for UpdateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            reason: err.to_string(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for query parsing and registration.
pub type QueryResult<T> = Result<T, QueryError>;

/// Result type for update parsing.
pub type UpdateResult<T> = Result<T, UpdateError>;
