//! The closed set of update kinds.
//!
//! Every table that has one entry per kind (the [`UpdateKind`] enum, the
//! fields of [`Update`](super::Update), the alias accessors of
//! [`Event`](crate::Event), the [`Narrowed`](crate::Narrowed) view) is
//! generated from the single list in [`with_update_kinds!`], so adding a kind
//! is a one-line change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::QueryError;

/// Invokes `$mac!` with the full list of update kinds.
///
/// Each entry is `Variant => field, "alias";` where `field` is the canonical
/// snake_case name used on the wire and in filter queries.
macro_rules! with_update_kinds {
    ($mac:ident) => {
        $mac! {
            Message => message, "message";
            EditedMessage => edited_message, "editedMessage";
            ChannelPost => channel_post, "channelPost";
            EditedChannelPost => edited_channel_post, "editedChannelPost";
            MessageReaction => message_reaction, "messageReaction";
            MessageReactionCount => message_reaction_count, "messageReactionCount";
            InlineQuery => inline_query, "inlineQuery";
            ChosenInlineResult => chosen_inline_result, "chosenInlineResult";
            CallbackQuery => callback_query, "callbackQuery";
            ShippingQuery => shipping_query, "shippingQuery";
            PreCheckoutQuery => pre_checkout_query, "preCheckoutQuery";
            Poll => poll, "poll";
            PollAnswer => poll_answer, "pollAnswer";
            MyChatMember => my_chat_member, "myChatMember";
            ChatMember => chat_member, "chatMember";
            ChatJoinRequest => chat_join_request, "chatJoinRequest";
            ChatBoost => chat_boost, "chatBoost";
            RemovedChatBoost => removed_chat_boost, "removedChatBoost";
        }
    };
}

pub(crate) use with_update_kinds;

macro_rules! define_update_kind {
    ($($variant:ident => $field:ident, $alias:literal;)*) => {
        /// Tag of the variant field carried by an update.
        ///
        /// The declaration order is also the order in which [`UpdateKind::ALL`]
        /// lists the kinds.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum UpdateKind {
            $(
                #[doc = concat!("The `", stringify!($field), "` variant.")]
                $variant,
            )*
        }

        impl UpdateKind {
            /// All update kinds in declaration order.
            pub const ALL: &'static [UpdateKind] = &[$(UpdateKind::$variant,)*];

            /// Returns the canonical (snake_case) name, as used in filter queries.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(UpdateKind::$variant => stringify!($field),)*
                }
            }

            /// Returns the camelCase alias of this kind.
            pub const fn alias(self) -> &'static str {
                match self {
                    $(UpdateKind::$variant => $alias,)*
                }
            }

            /// Looks a kind up by its canonical name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($field) => Some(UpdateKind::$variant),)*
                    _ => None,
                }
            }

            /// Looks a kind up by its alias.
            pub fn from_alias(alias: &str) -> Option<Self> {
                match alias {
                    $($alias => Some(UpdateKind::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

with_update_kinds!(define_update_kind);

impl UpdateKind {
    /// Number of update kinds.
    pub const COUNT: usize = Self::ALL.len();
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateKind {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| QueryError::UnknownDiscriminator {
            query: s.to_string(),
            discriminator: s.to_string(),
        })
    }
}

impl Serialize for UpdateKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UpdateKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
