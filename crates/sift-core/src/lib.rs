//! # Sift Core
//!
//! The filter-query engine of the Sift update router.
//!
//! Given an update (a record with exactly one of eighteen variant fields set)
//! and a query such as `"message:entities:url"`, this crate answers two
//! questions:
//!
//! - **Shape**: which top-level variants are guaranteed present once the
//!   query has matched ([`ShapeContract`], [`ShapeUnion`]).
//! - **Match**: does this concrete update satisfy the query
//!   ([`FilterQuery`], [`Filter`], [`matcher`]).
//!
//! ## Layers
//!
//! ```text
//! ┌──────────────┐    ┌────────────────────┐    ┌───────────┐
//! │ Update/Event │───▶│ FilterQuery/Filter │───▶│  matcher  │──▶ bool / Narrowed
//! │   (model)    │    │ (grammar, shapes)  │    │(predicate)│
//! └──────────────┘    └────────────────────┘    └───────────┘
//! ```
//!
//! Malformed queries are rejected when they are parsed ([`QueryError`]);
//! matching itself is a pure function that never fails.
//!
//! ## Example
//!
//! ```rust
//! use sift_core::{Event, IntoFilter, Update, UpdateKind};
//!
//! let update = Update::from_json(r#"{"update_id": 1, "message": {"text": "hi"}}"#).unwrap();
//! let event = Event::new(update);
//!
//! let filter = ["message:text", "channel_post"].into_filter().unwrap();
//! assert!(filter.matches(&event));
//! assert!(filter.shape().admits(UpdateKind::ChannelPost));
//! ```

pub mod error;
pub mod event;
pub mod matcher;
pub mod query;
pub mod update;

pub use error::{QueryError, QueryResult, UpdateError, UpdateResult};
pub use event::{Event, Narrowed, Object};
pub use matcher::match_filter;
pub use query::{Filter, FilterQuery, IntoFilter, ShapeContract, ShapeUnion, resolve};
pub use update::{Payload, Update, UpdateKind};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        Event, Filter, FilterQuery, IntoFilter, Narrowed, Payload, QueryError, ShapeUnion,
        Update, UpdateKind, match_filter,
    };
}
