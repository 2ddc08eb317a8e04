//! Matcher builder functions for common update kinds.
//!
//! # Example
//!
//! ```rust,ignore
//! use sift_framework::{on, on_callback_query, on_message};
//!
//! runtime.register_matchers(vec![
//!     on_message().handler(log_message),
//!     on_callback_query().block(true).handler(answer_callback),
//!     on(["message:entities:url", "channel_post:entities:url"])?.handler(scan_links),
//! ]).await;
//! ```

use sift_core::{Filter, IntoFilter, QueryResult, UpdateKind};

use crate::matcher::Matcher;

/// Creates a matcher from queries.
///
/// Shorthand for `Matcher::new().on(filter)`.
pub fn on<F: IntoFilter>(filter: F) -> QueryResult<Matcher> {
    Matcher::new().on(filter)
}

/// Creates a matcher that accepts every update of `kind`.
///
/// Unlike [`on`] this cannot fail.
pub fn on_kind(kind: UpdateKind) -> Matcher {
    Matcher::new().filter(Filter::from_kind(kind))
}

/// Creates a matcher for `message` updates.
pub fn on_message() -> Matcher {
    on_kind(UpdateKind::Message)
}

/// Creates a matcher for `edited_message` updates.
pub fn on_edited_message() -> Matcher {
    on_kind(UpdateKind::EditedMessage)
}

/// Creates a matcher for `channel_post` updates.
pub fn on_channel_post() -> Matcher {
    on_kind(UpdateKind::ChannelPost)
}

/// Creates a matcher for `callback_query` updates.
pub fn on_callback_query() -> Matcher {
    on_kind(UpdateKind::CallbackQuery)
}

/// Creates a matcher for `inline_query` updates.
pub fn on_inline_query() -> Matcher {
    on_kind(UpdateKind::InlineQuery)
}
