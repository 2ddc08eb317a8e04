//! The update record.
//!
//! An [`Update`] is what the transport layer hands to the core: an id plus
//! exactly one present variant field. The "exactly one" rule is a documented
//! precondition and is not enforced by the type; [`Update::check_exclusive`]
//! verifies it for callers that want to.
//!
//! ```text
//! Update { update_id, message?, edited_message?, …, removed_chat_boost? }
//!                        └──────────── exactly one present ────────────┘
//! ```

pub mod kind;
pub mod payload;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{UpdateError, UpdateResult};

pub use kind::UpdateKind;
pub use payload::Payload;

use kind::with_update_kinds;

macro_rules! define_update {
    ($($variant:ident => $field:ident, $alias:literal;)*) => {
        /// A raw update with one present variant field.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct Update {
            /// Id assigned by the upstream source. Not used for matching.
            pub update_id: i64,
            $(
                #[doc = concat!("Payload of a `", stringify!($field), "` update.")]
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<Payload>,
            )*
        }

        impl Update {
            /// Returns the payload of the given variant, if present.
            pub fn get(&self, kind: UpdateKind) -> Option<&Payload> {
                match kind {
                    $(UpdateKind::$variant => self.$field.as_ref(),)*
                }
            }

            /// Replaces the payload of the given variant.
            pub fn set(&mut self, kind: UpdateKind, payload: Option<Payload>) {
                match kind {
                    $(UpdateKind::$variant => self.$field = payload,)*
                }
            }
        }
    };
}

with_update_kinds!(define_update);

impl Update {
    /// Creates an update with no variant set.
    pub fn new(update_id: i64) -> Self {
        Self {
            update_id,
            ..Default::default()
        }
    }

    /// Sets a variant payload (builder pattern).
    pub fn with(mut self, kind: UpdateKind, payload: Payload) -> Self {
        self.set(kind, Some(payload));
        self
    }

    /// Parses an update from a JSON string.
    ///
    /// Unknown top-level keys are ignored.
    pub fn from_json(raw: &str) -> UpdateResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Parses an update from an already decoded JSON value.
    pub fn from_value(value: Value) -> UpdateResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Iterates over the kinds whose payload is present, in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = UpdateKind> + '_ {
        UpdateKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.get(*kind).is_some())
    }

    /// Returns the kind of this update.
    ///
    /// For a well-formed update this is its only present variant. Otherwise
    /// the first present variant in declaration order is returned.
    pub fn kind(&self) -> Option<UpdateKind> {
        self.kinds().next()
    }

    /// Verifies that exactly one variant is present and returns its kind.
    pub fn check_exclusive(&self) -> UpdateResult<UpdateKind> {
        let mut kinds = self.kinds();
        let Some(kind) = kinds.next() else {
            return Err(UpdateError::NoVariant {
                update_id: self.update_id,
            });
        };

        let extra = kinds.count();
        if extra > 0 {
            return Err(UpdateError::MultipleVariants {
                update_id: self.update_id,
                count: extra + 1,
            });
        }

        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_single_variant() {
        let update = Update::from_json(
            r#"{"update_id": 7, "callback_query": {"id": "q", "data": "yes"}}"#,
        )
        .unwrap();

        assert_eq!(update.update_id, 7);
        assert_eq!(update.kind(), Some(UpdateKind::CallbackQuery));
        assert_eq!(update.check_exclusive().unwrap(), UpdateKind::CallbackQuery);
        assert_eq!(
            update.callback_query.as_ref().and_then(|q| q.str("data")),
            Some("yes")
        );
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let update = Update::from_value(json!({
            "update_id": 1,
            "business_message": {"text": "ignored"},
            "poll": {"id": "p"}
        }))
        .unwrap();

        assert_eq!(update.kinds().collect::<Vec<_>>(), vec![UpdateKind::Poll]);
    }

    #[test]
    fn test_null_variant_is_absent() {
        let update =
            Update::from_value(json!({"update_id": 1, "message": null, "poll": {}})).unwrap();
        assert_eq!(update.kind(), Some(UpdateKind::Poll));
    }

    #[test]
    fn test_check_exclusive_reports_violations() {
        let empty = Update::new(3);
        assert!(matches!(
            empty.check_exclusive(),
            Err(UpdateError::NoVariant { update_id: 3 })
        ));

        let double = Update::new(4)
            .with(UpdateKind::Message, Payload::new())
            .with(UpdateKind::ChannelPost, Payload::new());
        assert!(matches!(
            double.check_exclusive(),
            Err(UpdateError::MultipleVariants { count: 2, .. })
        ));
        assert_eq!(double.kind(), Some(UpdateKind::Message));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Update::from_json("{\"update_id\": \"x\"}"),
            Err(UpdateError::Parse { .. })
        ));
    }

    #[test]
    fn test_serialize_skips_absent_variants() {
        let update = Update::new(9).with(UpdateKind::ChatBoost, Payload::new());
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, json!({"update_id": 9, "chat_boost": {}}));
    }
}
