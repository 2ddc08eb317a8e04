//! Extractor system for the Sift framework.
//!
//! This module provides the [`FromContext`] trait, which defines how types
//! can be extracted from an [`UpdateContext`] for use as handler parameters.
//!
//! The built-in extractors cover the event itself, the raw update, the
//! aggregate views of [`Event`] ([`Msg`], [`Chat`], [`Sender`]), the active
//! variant ([`Variant`]), and per-dispatch state ([`MatchedQuery`],
//! [`Propagation`]).

use std::ops::Deref;
use std::sync::Arc;

use sift_core::{Event, Object, Payload, Update, UpdateKind};

use crate::context::{MatchedQuery, Propagation, UpdateContext};
use crate::error::ExtractError;

/// A trait for types that can be extracted from an [`UpdateContext`].
///
/// If extraction fails the handler asking for the value is skipped.
///
/// # Example
///
/// ```rust,ignore
/// use sift_framework::{ExtractError, FromContext, UpdateContext};
///
/// struct ChatId(i64);
///
/// impl FromContext for ChatId {
///     fn from_context(ctx: &UpdateContext) -> Result<Self, ExtractError> {
///         ctx.event()
///             .chat()
///             .and_then(|chat| chat.get("id"))
///             .and_then(|id| id.as_i64())
///             .map(ChatId)
///             .ok_or_else(|| ExtractError::custom("no chat id"))
///     }
/// }
/// ```
pub trait FromContext: Sized {
    /// Attempts to extract this type from the given context.
    fn from_context(ctx: &UpdateContext) -> Result<Self, ExtractError>;
}

impl FromContext for Event {
    fn from_context(ctx: &UpdateContext) -> Result<Self, ExtractError> {
        Ok(ctx.event().clone())
    }
}

impl FromContext for Arc<Update> {
    fn from_context(ctx: &UpdateContext) -> Result<Self, ExtractError> {
        Ok(ctx.event().update_arc())
    }
}

impl FromContext for UpdateKind {
    fn from_context(ctx: &UpdateContext) -> Result<Self, ExtractError> {
        ctx.event().kind().ok_or_else(|| missing(ctx, "variant"))
    }
}

impl FromContext for Propagation {
    fn from_context(ctx: &UpdateContext) -> Result<Self, ExtractError> {
        Ok(ctx.propagation())
    }
}

impl FromContext for MatchedQuery {
    fn from_context(ctx: &UpdateContext) -> Result<Self, ExtractError> {
        ctx.get_state::<MatchedQuery>()
            .ok_or(ExtractError::NoMatchedQuery)
    }
}

/// Implementation for `Option<T>` where `T: FromContext`.
///
/// Optional parameters never cause a handler to be skipped.
impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &UpdateContext) -> Result<Self, ExtractError> {
        Ok(T::from_context(ctx).ok())
    }
}

fn missing(ctx: &UpdateContext, what: &'static str) -> ExtractError {
    ExtractError::Missing {
        what,
        update_id: ctx.event().update_id(),
    }
}

// ============================================================================
// Aggregate extractors
// ============================================================================

macro_rules! object_extractor {
    ($(#[$meta:meta])* $name:ident => $accessor:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(pub Object);

        impl $name {
            /// Consumes the extractor, returning the owned object.
            pub fn into_inner(self) -> Object {
                self.0
            }
        }

        impl Deref for $name {
            type Target = Object;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl FromContext for $name {
            fn from_context(ctx: &UpdateContext) -> Result<Self, ExtractError> {
                ctx.event()
                    .$accessor()
                    .cloned()
                    .map($name)
                    .ok_or_else(|| missing(ctx, $what))
            }
        }
    };
}

object_extractor!(
    /// The message object of the update, as found by [`Event::msg`].
    Msg => msg, "message"
);

object_extractor!(
    /// The chat object of the update, as found by [`Event::chat`].
    Chat => chat, "chat"
);

object_extractor!(
    /// The author of the update, as found by [`Event::from_user`].
    Sender => from_user, "sender"
);

/// The active variant of the update together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// Which variant is set.
    pub kind: UpdateKind,
    /// Its payload.
    pub payload: Payload,
}

impl FromContext for Variant {
    fn from_context(ctx: &UpdateContext) -> Result<Self, ExtractError> {
        let narrowed = ctx.event().narrow().ok_or_else(|| missing(ctx, "variant"))?;
        Ok(Variant {
            kind: narrowed.kind(),
            payload: narrowed.payload().clone(),
        })
    }
}
