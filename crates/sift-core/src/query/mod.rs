//! Filter query grammar.
//!
//! A filter query is a colon-separated path of one to three segments:
//!
//! ```text
//! message                  L1: the update must be a message
//! message:text             L2: ... whose payload has a `text` field
//! message:entities:url     L3: ... with an entity of type `url`
//! ```
//!
//! The first segment (the *discriminator*) must name an [`UpdateKind`]. The
//! deeper segments are opaque keys that only the runtime matcher looks at.
//! Everything is validated when a query is parsed, so a query that exists is
//! always well-formed.

pub mod filter;
pub mod shape;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{QueryError, QueryResult};
use crate::update::UpdateKind;

pub use filter::{Filter, IntoFilter};
pub use shape::{ShapeContract, ShapeUnion, resolve};

/// Separator between query segments.
pub const SEPARATOR: char = ':';

/// Maximum number of segments in a query.
pub const MAX_DEPTH: usize = 3;

/// A parsed, validated filter query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterQuery {
    raw: String,
    discriminator: UpdateKind,
    l2: Option<String>,
    l3: Option<String>,
}

impl FilterQuery {
    /// Parses a query string.
    pub fn parse(query: &str) -> QueryResult<Self> {
        if query.is_empty() {
            return Err(QueryError::Empty);
        }

        let segments: Vec<&str> = query.split(SEPARATOR).collect();
        if segments.len() > MAX_DEPTH {
            return Err(QueryError::TooDeep {
                query: query.to_string(),
                depth: segments.len(),
                max: MAX_DEPTH,
            });
        }

        if let Some(position) = segments.iter().position(|s| s.is_empty()) {
            return Err(QueryError::EmptySegment {
                query: query.to_string(),
                position,
            });
        }

        let discriminator =
            UpdateKind::from_name(segments[0]).ok_or_else(|| QueryError::UnknownDiscriminator {
                query: query.to_string(),
                discriminator: segments[0].to_string(),
            })?;

        Ok(Self {
            raw: query.to_string(),
            discriminator,
            l2: segments.get(1).map(|s| s.to_string()),
            l3: segments.get(2).map(|s| s.to_string()),
        })
    }

    /// Creates a first-level query for the given kind.
    pub fn from_kind(kind: UpdateKind) -> Self {
        Self {
            raw: kind.as_str().to_string(),
            discriminator: kind,
            l2: None,
            l3: None,
        }
    }

    /// Returns the update kind named by the first segment.
    pub fn discriminator(&self) -> UpdateKind {
        self.discriminator
    }

    /// Returns the second segment, if any.
    pub fn l2(&self) -> Option<&str> {
        self.l2.as_deref()
    }

    /// Returns the third segment, if any.
    pub fn l3(&self) -> Option<&str> {
        self.l3.as_deref()
    }

    /// Returns the number of segments (1 to 3).
    pub fn depth(&self) -> usize {
        1 + usize::from(self.l2.is_some()) + usize::from(self.l3.is_some())
    }

    /// Returns the query exactly as it was written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the shape contract of this query.
    pub fn shape(&self) -> ShapeContract {
        ShapeContract::for_query(self)
    }
}

impl fmt::Display for FilterQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for FilterQuery {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for FilterQuery {
    type Error = QueryError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<UpdateKind> for FilterQuery {
    fn from(kind: UpdateKind) -> Self {
        Self::from_kind(kind)
    }
}

impl Serialize for FilterQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for FilterQuery {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
