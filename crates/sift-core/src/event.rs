//! The event wrapper handed to handlers.
//!
//! An [`Event`] wraps one shared, read-only [`Update`] and exposes:
//!
//! - one alias accessor per variant (`event.edited_message()` is
//!   `event.update().edited_message`), also reachable by camelCase alias via
//!   [`Event::by_alias`];
//! - aggregate accessors ([`msg`](Event::msg), [`chat`](Event::chat),
//!   [`sender_chat`](Event::sender_chat), [`from_user`](Event::from_user),
//!   [`inline_message_id`](Event::inline_message_id)) that search the
//!   variants in a fixed order. They are recomputed on every call.
//!
//! Nothing here can fail: missing data is `None`.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::update::kind::with_update_kinds;
use crate::update::payload::object_field;
use crate::update::{Payload, Update, UpdateKind};

/// A JSON object borrowed from an update, as returned by the aggregate accessors.
pub type Object = Map<String, Value>;

/// A read-only view over a single [`Update`].
///
/// Cloning an `Event` is cheap; all clones share the same update.
#[derive(Debug, Clone)]
pub struct Event {
    update: Arc<Update>,
}

macro_rules! define_aliases {
    ($($variant:ident => $field:ident, $alias:literal;)*) => {
        impl Event {
            $(
                #[doc = concat!("Alias for `update.", stringify!($field), "`.")]
                pub fn $field(&self) -> Option<&Payload> {
                    self.update.$field.as_ref()
                }
            )*
        }

        /// A borrowed view of an update's active variant.
        ///
        /// This is the runtime counterpart of a narrowed shape: matching on it
        /// gives direct access to the one payload that is known to be present.
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub enum Narrowed<'a> {
            $(
                #[doc = concat!("A `", stringify!($field), "` update.")]
                $variant(&'a Payload),
            )*
        }

        impl<'a> Narrowed<'a> {
            /// Builds the view for `kind` if `update` carries it.
            pub fn of(update: &'a Update, kind: UpdateKind) -> Option<Self> {
                match kind {
                    $(UpdateKind::$variant => update.$field.as_ref().map(Narrowed::$variant),)*
                }
            }

            /// Returns the kind of the active variant.
            pub fn kind(&self) -> UpdateKind {
                match self {
                    $(Narrowed::$variant(_) => UpdateKind::$variant,)*
                }
            }

            /// Returns the active payload.
            pub fn payload(&self) -> &'a Payload {
                match *self {
                    $(Narrowed::$variant(payload) => payload,)*
                }
            }
        }
    };
}

with_update_kinds!(define_aliases);

impl Event {
    /// Wraps an update.
    pub fn new(update: Update) -> Self {
        Self {
            update: Arc::new(update),
        }
    }

    /// Wraps an already shared update.
    pub fn from_arc(update: Arc<Update>) -> Self {
        Self { update }
    }

    /// Returns the wrapped update.
    pub fn update(&self) -> &Update {
        &self.update
    }

    /// Returns a new handle to the wrapped update.
    pub fn update_arc(&self) -> Arc<Update> {
        Arc::clone(&self.update)
    }

    /// Returns the id of the wrapped update.
    pub fn update_id(&self) -> i64 {
        self.update.update_id
    }

    /// Returns the payload of the given variant.
    pub fn get(&self, kind: UpdateKind) -> Option<&Payload> {
        self.update.get(kind)
    }

    /// Returns the payload behind a camelCase alias such as `"callbackQuery"`.
    ///
    /// Unknown aliases yield `None`, the same as an absent variant.
    pub fn by_alias(&self, alias: &str) -> Option<&Payload> {
        UpdateKind::from_alias(alias).and_then(|kind| self.get(kind))
    }

    /// Returns the kind of the wrapped update.
    pub fn kind(&self) -> Option<UpdateKind> {
        self.update.kind()
    }

    /// Returns a view of the active variant.
    pub fn narrow(&self) -> Option<Narrowed<'_>> {
        self.kind().and_then(|kind| Narrowed::of(&self.update, kind))
    }

    // AGGREGATION SHORTCUTS
    // Precedence chains must stay in this exact order.

    /// The message object, wherever it is.
    ///
    /// Checks `message`, `edited_message`, `callback_query.message`,
    /// `channel_post` and `edited_channel_post`, in that order.
    pub fn msg(&self) -> Option<&Object> {
        self.message()
            .map(Payload::as_map)
            .or_else(|| self.edited_message().map(Payload::as_map))
            .or_else(|| self.callback_query().and_then(|q| q.object("message")))
            .or_else(|| self.channel_post().map(Payload::as_map))
            .or_else(|| self.edited_channel_post().map(Payload::as_map))
    }

    /// The chat object, wherever it is.
    ///
    /// Takes the first present object among [`msg`](Self::msg),
    /// `message_reaction`, `message_reaction_count`, `my_chat_member`,
    /// `chat_member`, `chat_join_request`, `chat_boost` and
    /// `removed_chat_boost`, then reads its `chat` field. If that first
    /// object has no chat the result is `None`; later sources are not tried.
    pub fn chat(&self) -> Option<&Object> {
        self.msg()
            .or_else(|| {
                self.first_payload(&[
                    UpdateKind::MessageReaction,
                    UpdateKind::MessageReactionCount,
                    UpdateKind::MyChatMember,
                    UpdateKind::ChatMember,
                    UpdateKind::ChatJoinRequest,
                    UpdateKind::ChatBoost,
                    UpdateKind::RemovedChatBoost,
                ])
            })
            .and_then(|source| object_field(source, "chat"))
    }

    /// The `sender_chat` of [`msg`](Self::msg).
    pub fn sender_chat(&self) -> Option<&Object> {
        self.msg().and_then(|msg| object_field(msg, "sender_chat"))
    }

    /// The author of the update, wherever it is.
    ///
    /// `message_reaction.user` wins if present. Otherwise the first present
    /// object among `callback_query`, `inline_query`, `shipping_query`,
    /// `pre_checkout_query`, `chosen_inline_result`, [`msg`](Self::msg),
    /// `my_chat_member`, `chat_member` and `chat_join_request` is taken and
    /// its `from` field returned.
    pub fn from_user(&self) -> Option<&Object> {
        if let Some(user) = self.message_reaction().and_then(|r| r.object("user")) {
            return Some(user);
        }

        self.first_payload(&[
            UpdateKind::CallbackQuery,
            UpdateKind::InlineQuery,
            UpdateKind::ShippingQuery,
            UpdateKind::PreCheckoutQuery,
            UpdateKind::ChosenInlineResult,
        ])
        .or_else(|| self.msg())
        .or_else(|| {
            self.first_payload(&[
                UpdateKind::MyChatMember,
                UpdateKind::ChatMember,
                UpdateKind::ChatJoinRequest,
            ])
        })
        .and_then(|source| object_field(source, "from"))
    }

    /// The inline message id of a `callback_query` or `chosen_inline_result`.
    pub fn inline_message_id(&self) -> Option<&str> {
        self.callback_query()
            .and_then(|q| q.str("inline_message_id"))
            .or_else(|| {
                self.chosen_inline_result()
                    .and_then(|r| r.str("inline_message_id"))
            })
    }

    fn first_payload(&self, kinds: &[UpdateKind]) -> Option<&Object> {
        kinds
            .iter()
            .find_map(|kind| self.get(*kind))
            .map(Payload::as_map)
    }
}

impl From<Update> for Event {
    fn from(update: Update) -> Self {
        Self::new(update)
    }
}

impl From<Arc<Update>> for Event {
    fn from(update: Arc<Update>) -> Self {
        Self::from_arc(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> Event {
        Event::new(Update::from_value(value).unwrap())
    }

    #[test]
    fn test_alias_accessors_share_the_update() {
        let event = event(json!({"update_id": 1, "edited_message": {"text": "x"}}));

        for kind in UpdateKind::ALL {
            match (event.by_alias(kind.alias()), event.update().get(*kind)) {
                (Some(a), Some(b)) => assert!(std::ptr::eq(a, b)),
                (None, None) => {}
                other => panic!("alias mismatch for {kind}: {other:?}"),
            }
        }
        assert!(std::ptr::eq(
            event.edited_message().unwrap(),
            event.update().edited_message.as_ref().unwrap()
        ));
        assert!(event.by_alias("edited_message").is_none());
    }

    #[test]
    fn test_at_most_one_accessor_present() {
        let event = event(json!({"update_id": 2, "callback_query": {"id": "c"}}));
        let present = UpdateKind::ALL
            .iter()
            .filter(|kind| event.get(**kind).is_some())
            .count();
        assert_eq!(present, 1);
        assert!(event.message().is_none());
    }

    #[test]
    fn test_msg_precedence() {
        let from_callback = event(json!({
            "update_id": 3,
            "callback_query": {"id": "c", "message": {"message_id": 10}}
        }));
        assert_eq!(from_callback.msg().unwrap()["message_id"], json!(10));

        let post = event(json!({"update_id": 4, "channel_post": {"message_id": 11}}));
        assert_eq!(post.msg().unwrap()["message_id"], json!(11));

        let inline = event(json!({"update_id": 5, "inline_query": {"id": "i"}}));
        assert!(inline.msg().is_none());
    }

    #[test]
    fn test_chat_does_not_fall_through_past_first_source() {
        let event = event(json!({
            "update_id": 6,
            "message": {"message_id": 1},
            "chat_member": {"chat": {"id": 99}}
        }));
        assert!(event.chat().is_none());
    }

    #[test]
    fn test_chat_from_member_updates() {
        let event = event(json!({
            "update_id": 7,
            "chat_join_request": {"chat": {"id": -100}, "from": {"id": 5}}
        }));
        assert_eq!(event.chat().unwrap()["id"], json!(-100));
        assert_eq!(event.from_user().unwrap()["id"], json!(5));
    }

    #[test]
    fn test_from_user_prefers_reaction_user() {
        let reaction = event(json!({
            "update_id": 8,
            "message_reaction": {"chat": {"id": 1}, "user": {"id": 42}}
        }));
        assert_eq!(reaction.from_user().unwrap()["id"], json!(42));
        assert_eq!(reaction.chat().unwrap()["id"], json!(1));

        let anonymous = event(json!({
            "update_id": 9,
            "message_reaction": {"chat": {"id": 1}, "actor_chat": {"id": 2}}
        }));
        assert!(anonymous.from_user().is_none());
    }

    #[test]
    fn test_sender_chat_and_inline_message_id() {
        let post = event(json!({
            "update_id": 10,
            "channel_post": {"sender_chat": {"id": -5}, "chat": {"id": -5}}
        }));
        assert_eq!(post.sender_chat().unwrap()["id"], json!(-5));

        let chosen = event(json!({
            "update_id": 11,
            "chosen_inline_result": {"from": {"id": 3}, "inline_message_id": "abc"}
        }));
        assert_eq!(chosen.inline_message_id(), Some("abc"));
        assert_eq!(chosen.from_user().unwrap()["id"], json!(3));
    }

    #[test]
    fn test_chat_through_callback_message() {
        let event = event(json!({
            "update_id": 13,
            "callback_query": {
                "id": "c",
                "from": {"id": 4},
                "message": {"message_id": 1, "chat": {"id": 77}}
            }
        }));
        assert_eq!(event.chat().unwrap()["id"], json!(77));
        assert_eq!(event.from_user().unwrap()["id"], json!(4));
    }

    #[test]
    fn test_inline_message_id_prefers_callback_query() {
        let both = event(json!({
            "update_id": 14,
            "callback_query": {"id": "c", "inline_message_id": "from-callback"},
            "chosen_inline_result": {"result_id": "r", "inline_message_id": "from-result"}
        }));
        assert_eq!(both.inline_message_id(), Some("from-callback"));

        let without = event(json!({
            "update_id": 15,
            "callback_query": {"id": "c"},
            "chosen_inline_result": {"result_id": "r", "inline_message_id": "from-result"}
        }));
        assert_eq!(without.inline_message_id(), Some("from-result"));
    }

    #[test]
    fn test_from_user_falls_through_to_member_updates() {
        let member = event(json!({
            "update_id": 16,
            "my_chat_member": {"chat": {"id": -1}, "from": {"id": 21}}
        }));
        assert_eq!(member.from_user().unwrap()["id"], json!(21));

        let author_wins = event(json!({
            "update_id": 17,
            "message": {"from": {"id": 1}},
            "my_chat_member": {"from": {"id": 21}}
        }));
        assert_eq!(author_wins.from_user().unwrap()["id"], json!(1));

        let query_wins = event(json!({
            "update_id": 18,
            "inline_query": {"from": {"id": 2}},
            "message": {"from": {"id": 1}}
        }));
        assert_eq!(query_wins.from_user().unwrap()["id"], json!(2));
    }

    #[test]
    fn test_msg_prefers_edited_message_over_callback() {
        let edited = event(json!({
            "update_id": 19,
            "edited_message": {"message_id": 2},
            "callback_query": {"message": {"message_id": 3}},
            "edited_channel_post": {"message_id": 4}
        }));
        assert_eq!(edited.msg().unwrap()["message_id"], json!(2));

        let last = event(json!({"update_id": 20, "edited_channel_post": {"message_id": 4}}));
        assert_eq!(last.msg().unwrap()["message_id"], json!(4));
    }

    #[test]
    fn test_narrow() {
        let event = event(json!({"update_id": 12, "poll_answer": {"poll_id": "p"}}));
        let narrowed = event.narrow().unwrap();

        assert_eq!(narrowed.kind(), UpdateKind::PollAnswer);
        assert!(matches!(narrowed, Narrowed::PollAnswer(p) if p.str("poll_id") == Some("p")));
        assert!(Narrowed::of(event.update(), UpdateKind::Poll).is_none());
    }
}
