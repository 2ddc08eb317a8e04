//! Runtime matching of filter queries against events.
//!
//! A query is checked one segment at a time:
//!
//! 1. the discriminator's variant must be present on the update;
//! 2. an L2 segment must name a present key of that variant's payload;
//! 3. an L3 segment must name an *entry* of the L2 value. When the L2 value
//!    is a list, some element must be tagged with the segment: an object
//!    whose `type` field equals it, or a string equal to it. A list of
//!    entities such as `[{"type": "text_link", "url": ...}]` therefore does
//!    not match `:url`. When the L2 value is a single object, it qualifies
//!    if its `type` equals the segment or it holds a present key of that
//!    name (`my_chat_member:new_chat_member:can_manage_chat`). Comparison is
//!    case-sensitive.
//!
//! A failed step is a plain "no match". Matching never mutates anything and
//! never fails.

use serde_json::Value;
use tracing::trace;

use crate::error::QueryResult;
use crate::event::Event;
use crate::query::{Filter, FilterQuery, IntoFilter};
use crate::update::payload::present;

/// Key of an L3 entry compared against the L3 segment.
pub const DISCRIMINATING_KEY: &str = "type";

/// Returns `true` if `query` matches `event`.
pub fn matches(query: &FilterQuery, event: &Event) -> bool {
    let matched = check(query, event);
    trace!(
        query = %query,
        update_id = event.update_id(),
        matched,
        "Checked filter query"
    );
    matched
}

fn check(query: &FilterQuery, event: &Event) -> bool {
    let Some(payload) = event.get(query.discriminator()) else {
        return false;
    };

    let Some(l2) = query.l2() else {
        return true;
    };
    let Some(value) = payload.get(l2) else {
        return false;
    };

    match query.l3() {
        None => true,
        Some(l3) => has_entry(value, l3),
    }
}

/// Returns `true` if `container` holds an entry tagged `literal`.
fn has_entry(container: &Value, literal: &str) -> bool {
    match container {
        Value::Array(items) => items.iter().any(|item| is_tagged(item, literal)),
        Value::Object(map) => is_tagged(container, literal) || present(map.get(literal)).is_some(),
        other => is_tagged(other, literal),
    }
}

/// An entry is tagged by its `type` field, or is the literal itself.
fn is_tagged(entry: &Value, literal: &str) -> bool {
    match entry {
        Value::Object(map) => map.get(DISCRIMINATING_KEY).and_then(Value::as_str) == Some(literal),
        Value::String(s) => s == literal,
        _ => false,
    }
}

/// Builds a reusable predicate from a list of queries.
///
/// The queries are validated immediately; the returned closure never fails.
pub fn match_filter<F: IntoFilter>(
    filter: F,
) -> QueryResult<impl Fn(&Event) -> bool + Send + Sync> {
    filter.into_filter().map(Filter::into_predicate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::update::Update;
    use serde_json::json;

    fn event(value: Value) -> Event {
        Event::new(Update::from_value(value).unwrap())
    }

    fn query(raw: &str) -> FilterQuery {
        FilterQuery::parse(raw).unwrap()
    }

    #[test]
    fn test_discriminator_only() {
        let callback = event(json!({"update_id": 1, "callback_query": {"id": "c"}}));
        assert!(matches(&query("callback_query"), &callback));
        assert!(!matches(&query("message"), &callback));
    }

    #[test]
    fn test_l2_presence() {
        let text = event(json!({"update_id": 1, "message": {"text": "hello"}}));
        let photo = event(json!({"update_id": 2, "message": {"photo": [{"file_id": "f"}]}}));
        let null_text = event(json!({"update_id": 3, "message": {"text": null}}));

        assert!(matches(&query("message:text"), &text));
        assert!(!matches(&query("message:text"), &photo));
        assert!(!matches(&query("message:text"), &null_text));
        assert!(matches(&query("message"), &photo));
    }

    #[test]
    fn test_l3_entity_type() {
        let event = event(json!({
            "update_id": 1,
            "message": {
                "text": "/start https://example.com",
                "entities": [
                    {"type": "bot_command", "offset": 0, "length": 6},
                    {"type": "url", "offset": 7, "length": 19}
                ]
            }
        }));

        assert!(matches(&query("message:entities:url"), &event));
        assert!(matches(&query("message:entities:bot_command"), &event));
        assert!(!matches(&query("message:entities:hashtag"), &event));
        assert!(!matches(&query("message:entities:URL"), &event));
        assert!(!matches(&query("message:caption_entities:url"), &event));
    }

    #[test]
    fn test_l3_list_entries_match_by_type_only() {
        let event = event(json!({
            "update_id": 1,
            "message": {
                "text": "docs",
                "entities": [
                    {"type": "text_link", "offset": 0, "length": 4, "url": "https://x.y"}
                ]
            }
        }));

        assert!(matches(&query("message:entities:text_link"), &event));
        assert!(!matches(&query("message:entities:url"), &event));
        assert!(!matches(&query("message:entities:offset"), &event));
    }

    #[test]
    fn test_l3_on_single_object() {
        let event = event(json!({
            "update_id": 1,
            "my_chat_member": {
                "new_chat_member": {"status": "administrator", "can_manage_chat": true}
            }
        }));

        assert!(matches(&query("my_chat_member:new_chat_member:can_manage_chat"), &event));
        assert!(!matches(&query("my_chat_member:new_chat_member:can_delete_messages"), &event));
        assert!(!matches(&query("my_chat_member:old_chat_member:can_manage_chat"), &event));
    }

    #[test]
    fn test_l3_on_string_list() {
        let event = event(json!({"update_id": 1, "poll": {"options": ["a", "b"]}}));
        assert!(matches(&query("poll:options:b"), &event));
        assert!(!matches(&query("poll:options:c"), &event));
    }

    #[test]
    fn test_match_filter_validates_eagerly() {
        let predicate = match_filter(["message", "channel_post"]).unwrap();
        assert!(predicate(&event(json!({"update_id": 1, "channel_post": {}}))));
        assert!(!predicate(&event(json!({"update_id": 2, "callback_query": {}}))));

        assert!(matches!(
            match_filter("bogus_field"),
            Err(QueryError::UnknownDiscriminator { .. })
        ));
    }
}
