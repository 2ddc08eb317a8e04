//! # Sift Framework
//!
//! Routing components built on the Sift filter-query engine.
//!
//! This layer provides:
//! - [`Matcher`]: filters plus the handlers they guard, with chained
//!   narrowing and a combined shape contract
//! - [`Dispatcher`]: ordered broadcast of updates to matchers
//! - Axum-style [`Handler`]s whose parameters are [`FromContext`] extractors
//! - Convenience builders ([`on`], [`on_message`], [`on_callback_query`], ...)

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod handler;
pub mod matcher;
pub mod matcher_builders;

pub use context::{MatchedQuery, Propagation, UpdateContext};
pub use dispatcher::Dispatcher;
pub use error::{ExtractError, ExtractResult};
pub use extractor::{Chat, FromContext, Msg, Sender, Variant};
pub use handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler, HandlerFn, into_handler};
pub use matcher::{CheckFn, Matcher, MatcherResponse};
pub use matcher_builders::{
    on, on_callback_query, on_channel_post, on_edited_message, on_inline_query, on_kind,
    on_message,
};
