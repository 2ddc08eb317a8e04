//! # Sift
//!
//! Typed filter queries and update routing for Telegram-style bot updates.
//!
//! An update carries exactly one of eighteen variant fields. Handlers are
//! registered against filter queries such as `"message:entities:url"`; each
//! query is validated when it is registered and describes both a runtime
//! check and the shape an accepted update is guaranteed to have.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐     ┌────────────┐     ┌──────────────────────────────┐
//! │    Runtime    │────▶│ Dispatcher │────▶│ Matcher "links"  (filter)    │──▶ handlers
//! │ (config, I/O) │     │            │────▶│ Matcher "admins" (filter)    │──▶ handlers
//! └───────────────┘     └────────────┘────▶│ Matcher ...                  │──▶ handlers
//!                                          └──────────────────────────────┘
//! ```
//!
//! - **Core** ([`core`]): the update model, the query grammar, shape
//!   contracts and the runtime matcher
//! - **Framework** ([`framework`]): matchers, extractors, Axum-style handlers
//!   and the dispatcher
//! - **Runtime** ([`runtime`]): configuration, logging, named routes and the
//!   update loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sift::prelude::*;
//!
//! async fn links(msg: Msg, query: MatchedQuery) {
//!     info!(query = %query.0, "link in message {}", msg["message_id"]);
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = SiftRuntime::new()?;
//!     runtime
//!         .register_matcher(on(["message:entities:url", "channel_post:entities:url"])?.handler(links))
//!         .await;
//!     runtime.run(updates()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use sift_core as core;
pub use sift_framework as framework;
pub use sift_runtime as runtime;

/// Prelude module for convenient imports.
pub mod prelude {
    // Runtime - main entry point
    pub use sift_runtime::{RouteConfig, SiftConfig, SiftRuntime};

    // Update model and queries
    pub use sift_core::{
        Event, Filter, FilterQuery, IntoFilter, Narrowed, Payload, ShapeUnion, Update,
        UpdateKind, match_filter, resolve,
    };

    // Matchers and dispatch
    pub use sift_framework::{
        Dispatcher, Matcher, on, on_callback_query, on_channel_post, on_edited_message,
        on_inline_query, on_kind, on_message,
    };

    // Extractors - for handler parameters
    pub use sift_framework::{
        Chat, FromContext, MatchedQuery, Msg, Propagation, Sender, UpdateContext, Variant,
    };

    // Logging macros
    pub use sift_runtime::prelude::*;
}
