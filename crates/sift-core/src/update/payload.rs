//! Variant payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The payload carried by one variant field of an [`Update`](super::Update).
///
/// The core treats payloads as opaque records: it only ever asks whether a
/// key is present. A key whose value is JSON `null` counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Adds a field (builder pattern).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the value of `key`, or `None` if it is missing or `null`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        present(self.0.get(key))
    }

    /// Returns `true` if `key` is present and not `null`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the value of `key` if it is an object.
    pub fn object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key).and_then(Value::as_object)
    }

    /// Returns the value of `key` if it is a string.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the payload and returns the underlying JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Payload {
    type Error = Value;

    /// Succeeds for JSON objects and hands any other value back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

/// Maps JSON `null` to absence.
pub(crate) fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Object-typed field lookup on a plain JSON map, with `null` as absence.
pub(crate) fn object_field<'a>(
    map: &'a Map<String, Value>,
    key: &str,
) -> Option<&'a Map<String, Value>> {
    present(map.get(key)).and_then(Value::as_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_is_absent() {
        let payload = Payload::new().with("text", "hi").with("photo", Value::Null);

        assert!(payload.contains("text"));
        assert!(!payload.contains("photo"));
        assert!(!payload.contains("caption"));
        assert_eq!(payload.str("text"), Some("hi"));
    }

    #[test]
    fn test_try_from_value() {
        let payload = Payload::try_from(json!({"chat": {"id": 1}})).unwrap();
        assert_eq!(payload.object("chat").and_then(|c| c.get("id")), Some(&json!(1)));

        assert_eq!(Payload::try_from(json!([1, 2])), Err(json!([1, 2])));
    }
}
