//! Matcher system for the Sift framework.
//!
//! A [`Matcher`] groups handlers behind a filter. Its handlers run, in
//! order, only for updates the filter accepts.
//!
//! # Filters
//!
//! [`Matcher::on`] takes anything convertible into a
//! [`Filter`](sift_core::Filter): a query string, a list of alternatives, an
//! [`UpdateKind`](sift_core::UpdateKind). Malformed queries are rejected
//! right there, so a matcher that exists is always valid. Calling `on` more
//! than once chains the filters: an update must satisfy every one of them,
//! and the matcher's [`shape`](Matcher::shape) is the intersection of their
//! shape unions.
//!
//! # Tower Service Integration
//!
//! `Matcher` implements `tower::Service<Arc<UpdateContext>>`, so tower
//! middleware can be layered on top of it:
//!
//! ```rust,ignore
//! use tower::ServiceBuilder;
//! use tower::timeout::TimeoutLayer;
//! use std::time::Duration;
//!
//! let matcher = Matcher::new().on("message:text")?.handler(echo);
//!
//! let service = ServiceBuilder::new()
//!     .layer(TimeoutLayer::new(Duration::from_secs(5)))
//!     .service(matcher);
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use sift_framework::Matcher;
//!
//! let links = Matcher::new()
//!     .on(["message:entities:url", "channel_post:entities:url"])?
//!     .block(true)
//!     .handler(scan_links);
//!
//! let admins = Matcher::new()
//!     .on("my_chat_member:new_chat_member")?
//!     .check(|ctx| ctx.event().chat().is_some())
//!     .handler(on_promotion);
//! ```

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use sift_core::{Filter, FilterQuery, IntoFilter, QueryResult, ShapeUnion};
use tower::Service;
use tracing::{debug, trace};

use crate::context::{MatchedQuery, UpdateContext};
use crate::handler::{BoxedHandler, Handler, into_handler};

/// A type-erased check function.
pub type CheckFn = Arc<dyn Fn(&UpdateContext) -> bool + Send + Sync>;

/// Internal data for a Matcher.
///
/// Wrapped in an `Arc`; builders go through `Arc::make_mut`.
#[derive(Clone)]
struct MatcherInner {
    /// Filters that must all accept the update.
    filters: Vec<Filter>,

    /// Extra check run after the filters.
    check_fn: Option<CheckFn>,

    /// The handlers to execute when the matcher accepts the update.
    handlers: Vec<BoxedHandler>,

    /// Whether to block further matchers after this one processes the update.
    block: bool,

    /// Optional name for logging.
    name: Option<String>,
}

/// A filter plus the handlers it guards.
///
/// Cloning is cheap; clones share their configuration until one of them is
/// modified.
#[derive(Clone)]
pub struct Matcher {
    inner: Arc<MatcherInner>,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher {
    /// Creates a new empty matcher.
    ///
    /// A matcher with no filter and no check accepts every update.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MatcherInner {
                filters: Vec::new(),
                check_fn: None,
                handlers: Vec::new(),
                block: false,
                name: None,
            }),
        }
    }

    fn inner_mut(&mut self) -> &mut MatcherInner {
        Arc::make_mut(&mut self.inner)
    }

    /// Sets a name for this matcher.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner_mut().name = Some(name.into());
        self
    }

    /// Adds a filter built from queries.
    ///
    /// Fails if any query is malformed. The first filter also becomes the
    /// matcher's name unless one was set explicitly.
    pub fn on<F: IntoFilter>(self, filter: F) -> QueryResult<Self> {
        Ok(self.filter(filter.into_filter()?))
    }

    /// Adds an already validated filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        let inner = self.inner_mut();
        if inner.name.is_none() {
            inner.name = Some(filter.to_string());
        }
        inner.filters.push(filter);
        self
    }

    /// Sets a custom check run after the filters.
    pub fn check<F>(mut self, f: F) -> Self
    where
        F: Fn(&UpdateContext) -> bool + Send + Sync + 'static,
    {
        self.inner_mut().check_fn = Some(Arc::new(f));
        self
    }

    /// Sets whether this matcher blocks further matchers.
    ///
    /// A blocking matcher that accepts an update ends its dispatch.
    pub fn block(mut self, block: bool) -> Self {
        self.inner_mut().block = block;
        self
    }

    /// Adds a handler to this matcher.
    ///
    /// Handlers are executed in the order they are added.
    pub fn handler<F, T>(mut self, f: F) -> Self
    where
        F: Handler<T> + Send + Sync + 'static,
        T: 'static,
    {
        self.inner_mut().handlers.push(into_handler(f));
        self
    }

    /// Adds a pre-built boxed handler.
    pub fn handler_boxed(mut self, handler: BoxedHandler) -> Self {
        self.inner_mut().handlers.push(handler);
        self
    }

    /// Returns the chained filters.
    pub fn filters(&self) -> &[Filter] {
        &self.inner.filters
    }

    /// Returns the shapes an accepted update can have.
    ///
    /// Each chained filter narrows the result further. Without filters every
    /// shape is possible.
    pub fn shape(&self) -> ShapeUnion {
        self.inner
            .filters
            .iter()
            .fold(ShapeUnion::any(), |acc, filter| acc.intersect(&filter.shape()))
    }

    /// Checks the filters and the custom check against a context.
    ///
    /// Returns the query of the last filter that matched, or `None` if the
    /// update is rejected. An accepting matcher with no filters yields
    /// `Some(None)`.
    fn accept(&self, ctx: &UpdateContext) -> Option<Option<FilterQuery>> {
        let mut matched = None;
        for filter in &self.inner.filters {
            matched = Some(filter.first_match(ctx.event())?.clone());
        }

        match &self.inner.check_fn {
            Some(check) if !check(ctx) => None,
            _ => Some(matched),
        }
    }

    /// Returns `true` if this matcher accepts the update in `ctx`.
    pub fn matches(&self, ctx: &UpdateContext) -> bool {
        self.accept(ctx).is_some()
    }

    /// Returns whether this matcher blocks further matchers.
    pub fn is_blocking(&self) -> bool {
        self.inner.block
    }

    /// Returns the number of handlers in this matcher.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.len()
    }

    /// Returns the name of this matcher, if set.
    pub fn get_name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Executes all handlers if the matcher accepts the update.
    ///
    /// The matched query is stored in the context as [`MatchedQuery`].
    /// Remaining handlers are skipped once a handler stops propagation.
    /// Returns `true` if the matcher accepted the update.
    pub async fn execute(&self, ctx: Arc<UpdateContext>) -> bool {
        let name = self.get_name().unwrap_or("unnamed");

        let Some(matched) = self.accept(&ctx) else {
            trace!(matcher = name, "Matcher rejected update, skipping");
            return false;
        };

        debug!(
            matcher = name,
            query = matched.as_ref().map(FilterQuery::as_str),
            handler_count = self.inner.handlers.len(),
            "Matcher accepted update, executing handlers"
        );

        if let Some(query) = matched {
            ctx.set_state(MatchedQuery(query));
        }

        for (i, handler) in self.inner.handlers.iter().enumerate() {
            if !ctx.is_propagating() {
                debug!(matcher = name, handler_index = i, "Propagation stopped");
                break;
            }
            trace!(matcher = name, handler_index = i, "Executing handler");
            handler.call(Arc::clone(&ctx)).await;
        }

        true
    }
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher")
            .field("name", &self.inner.name)
            .field("filters", &self.inner.filters)
            .field("has_check", &self.inner.check_fn.is_some())
            .field("handler_count", &self.inner.handlers.len())
            .field("block", &self.inner.block)
            .finish()
    }
}

// ============================================================================
// Tower Service Implementation for Matcher
// ============================================================================

/// The response type for Matcher as a Service.
#[derive(Debug, Clone, Copy)]
pub struct MatcherResponse {
    /// Whether the matcher accepted the update and ran its handlers.
    pub matched: bool,
    /// Whether this matcher is blocking.
    pub blocking: bool,
}

impl MatcherResponse {
    /// Returns true if matched and blocking.
    pub fn should_stop(&self) -> bool {
        self.matched && self.blocking
    }
}

impl Service<Arc<UpdateContext>> for Matcher {
    type Response = MatcherResponse;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, ctx: Arc<UpdateContext>) -> Self::Future {
        let matcher = self.clone();

        Box::pin(async move {
            let matched = matcher.execute(ctx).await;
            Ok(MatcherResponse {
                matched,
                blocking: matcher.is_blocking(),
            })
        })
    }
}
