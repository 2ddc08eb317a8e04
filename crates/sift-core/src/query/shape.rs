//! Shape resolution.
//!
//! The shape of a query says which top-level variants are known to be
//! present once the query has matched. Because an update carries exactly one
//! variant, a query with discriminator `d` fixes the whole shape: `d` is
//! present and every other variant is absent.
//!
//! Deeper segments never refine the shape. `message:text` and `message` have
//! the same contract; whether `text` exists is only known at match time.
//!
//! A list of queries is an OR of alternatives, so its shape is the *union*
//! of the per-query contracts, one member per distinct discriminator:
//!
//! ```text
//! ["message", "channel_post", "message:text"]
//!   → { {message present, rest absent}, {channel_post present, rest absent} }
//! ```

use std::collections::BTreeSet;

use tracing::trace;

use super::{Filter, FilterQuery};
use crate::error::QueryResult;
use crate::update::UpdateKind;

/// The shape guaranteed by a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeContract {
    present: UpdateKind,
}

impl ShapeContract {
    /// The contract of a query.
    pub fn for_query(query: &FilterQuery) -> Self {
        Self::for_kind(query.discriminator())
    }

    /// The contract of an update known to be of `kind`.
    pub fn for_kind(kind: UpdateKind) -> Self {
        Self { present: kind }
    }

    /// Returns the variant guaranteed to be present.
    pub fn present(&self) -> UpdateKind {
        self.present
    }

    /// Returns `true` if `kind` is guaranteed present.
    pub fn is_present(&self, kind: UpdateKind) -> bool {
        self.present == kind
    }

    /// Returns `true` if `kind` is guaranteed absent.
    pub fn is_absent(&self, kind: UpdateKind) -> bool {
        self.present != kind
    }

    /// Iterates over the variants guaranteed to be absent.
    pub fn absent(&self) -> impl Iterator<Item = UpdateKind> + '_ {
        UpdateKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.is_absent(*kind))
    }
}

/// The union of shape contracts of a list of alternatives.
///
/// A value known to satisfy the list satisfies at least one member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapeUnion {
    members: BTreeSet<ShapeContract>,
}

impl ShapeUnion {
    /// The union of the contracts of `queries`.
    pub fn from_queries<'a>(queries: impl IntoIterator<Item = &'a FilterQuery>) -> Self {
        Self {
            members: queries.into_iter().map(ShapeContract::for_query).collect(),
        }
    }

    /// The union with every possible shape. This is the shape of an
    /// unfiltered update.
    pub fn any() -> Self {
        Self {
            members: UpdateKind::ALL
                .iter()
                .copied()
                .map(ShapeContract::for_kind)
                .collect(),
        }
    }

    /// Iterates over the member contracts in kind order.
    pub fn members(&self) -> impl Iterator<Item = &ShapeContract> {
        self.members.iter()
    }

    /// Returns the number of distinct member shapes.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no shape can satisfy this union.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns `true` if `contract` is one of the members.
    pub fn contains(&self, contract: &ShapeContract) -> bool {
        self.members.contains(contract)
    }

    /// Returns `true` if some member has `kind` present.
    pub fn admits(&self, kind: UpdateKind) -> bool {
        self.contains(&ShapeContract::for_kind(kind))
    }

    /// Returns the kind present in every member, if there is one.
    ///
    /// This is `Some` exactly when the union has a single member: only then
    /// can a field be read without checking for absence.
    pub fn guaranteed_present(&self) -> Option<UpdateKind> {
        match self.members.len() {
            1 => self.members.first().map(ShapeContract::present),
            _ => None,
        }
    }

    /// Returns `true` if `kind` is absent in every member.
    pub fn guaranteed_absent(&self, kind: UpdateKind) -> bool {
        !self.admits(kind)
    }

    /// The shapes satisfying both unions, as produced by chaining filters.
    ///
    /// The result may be empty, in which case the chain can never match.
    pub fn intersect(&self, other: &ShapeUnion) -> ShapeUnion {
        Self {
            members: self.members.intersection(&other.members).copied().collect(),
        }
    }
}

impl FromIterator<ShapeContract> for ShapeUnion {
    fn from_iter<I: IntoIterator<Item = ShapeContract>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

/// Resolves the shape of a list of raw query strings.
///
/// Fails on the first malformed query, before any update is looked at.
pub fn resolve<I, S>(queries: I) -> QueryResult<ShapeUnion>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let filter = Filter::new(queries)?;
    let shape = filter.shape();
    trace!(filter = %filter, members = shape.len(), "Resolved filter shape");
    Ok(shape)
}
