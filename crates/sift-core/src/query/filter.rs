//! Query lists.

use std::fmt;

use super::{FilterQuery, ShapeUnion};
use crate::error::{QueryError, QueryResult};
use crate::event::{Event, Narrowed};
use crate::matcher;
use crate::update::UpdateKind;

/// A non-empty list of alternative queries.
///
/// A filter matches an event when at least one of its queries does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    queries: Vec<FilterQuery>,
}

impl Filter {
    /// Parses a list of raw queries.
    ///
    /// Every query is validated here; the first invalid one is reported.
    pub fn new<I, S>(queries: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let queries = queries
            .into_iter()
            .map(|q| FilterQuery::parse(q.as_ref()))
            .collect::<QueryResult<Vec<_>>>()?;
        Self::from_queries(queries)
    }

    /// Builds a filter from parsed queries.
    pub fn from_queries(queries: Vec<FilterQuery>) -> QueryResult<Self> {
        if queries.is_empty() {
            return Err(QueryError::NoQueries);
        }
        Ok(Self { queries })
    }

    /// A filter with a single query.
    pub fn single(query: FilterQuery) -> Self {
        Self {
            queries: vec![query],
        }
    }

    /// A filter matching every update of `kind`.
    pub fn from_kind(kind: UpdateKind) -> Self {
        Self::single(FilterQuery::from_kind(kind))
    }

    /// Returns the alternatives in registration order.
    pub fn queries(&self) -> &[FilterQuery] {
        &self.queries
    }

    /// Returns the union of the alternatives' shape contracts.
    pub fn shape(&self) -> ShapeUnion {
        ShapeUnion::from_queries(&self.queries)
    }

    /// Returns `true` if any alternative matches.
    pub fn matches(&self, event: &Event) -> bool {
        self.first_match(event).is_some()
    }

    /// Returns the first alternative that matches.
    pub fn first_match(&self, event: &Event) -> Option<&FilterQuery> {
        self.queries.iter().find(|q| matcher::matches(q, event))
    }

    /// Returns a view of the matched variant if any alternative matches.
    pub fn narrow<'e>(&self, event: &'e Event) -> Option<Narrowed<'e>> {
        let query = self.first_match(event)?;
        Narrowed::of(event.update(), query.discriminator())
    }

    /// Turns this filter into a standalone predicate.
    pub fn into_predicate(self) -> impl Fn(&Event) -> bool + Send + Sync + 'static {
        move |event| self.matches(event)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.queries.as_slice() {
            [single] => write!(f, "{single}"),
            queries => {
                f.write_str("[")?;
                for (i, query) in queries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{query}")?;
                }
                f.write_str("]")
            }
        }
    }
}

// ============================================================================
// IntoFilter
// ============================================================================

/// Types that can be registered as a filter.
///
/// Conversion is where malformed queries are rejected, so it happens once,
/// at registration time.
pub trait IntoFilter {
    /// Converts `self` into a validated [`Filter`].
    fn into_filter(self) -> QueryResult<Filter>;
}

impl IntoFilter for Filter {
    fn into_filter(self) -> QueryResult<Filter> {
        Ok(self)
    }
}

impl IntoFilter for FilterQuery {
    fn into_filter(self) -> QueryResult<Filter> {
        Ok(Filter::single(self))
    }
}

impl IntoFilter for UpdateKind {
    fn into_filter(self) -> QueryResult<Filter> {
        Ok(Filter::from_kind(self))
    }
}

impl IntoFilter for &str {
    fn into_filter(self) -> QueryResult<Filter> {
        FilterQuery::parse(self).map(Filter::single)
    }
}

impl IntoFilter for String {
    fn into_filter(self) -> QueryResult<Filter> {
        self.as_str().into_filter()
    }
}

impl<S: AsRef<str>, const N: usize> IntoFilter for [S; N] {
    fn into_filter(self) -> QueryResult<Filter> {
        Filter::new(self)
    }
}

impl<S: AsRef<str>> IntoFilter for &[S] {
    fn into_filter(self) -> QueryResult<Filter> {
        Filter::new(self)
    }
}

impl<S: AsRef<str>> IntoFilter for Vec<S> {
    fn into_filter(self) -> QueryResult<Filter> {
        Filter::new(self)
    }
}
