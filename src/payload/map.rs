//! The normalized payload map.

use serde::Serialize;
use serde_json::{Map, Value};

/// Normalized JSON representation of one event.
///
/// Keys are kept in sorted order, so serializing the same payload always
/// yields the same bytes. Use the `insert_*` helpers to apply the presence
/// rule: empty strings, empty lists and `false` flags are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Key holding the event discriminator.
    pub const EVENT_TYPE: &'static str = "event_type";

    /// Creates a payload containing only `event_type`.
    #[must_use]
    pub fn new(event_type: &str) -> Self {
        let mut map = Map::new();
        map.insert(Self::EVENT_TYPE.to_string(), Value::from(event_type));
        Self(map)
    }

    /// Returns the `event_type` value.
    #[must_use]
    pub fn event_type(&self) -> Option<&str> {
        self.0.get(Self::EVENT_TYPE).and_then(Value::as_str)
    }

    /// Inserts a value unconditionally.
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Inserts a string only if it is non-empty.
    pub fn insert_non_empty(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.insert(key, value);
        }
    }

    /// Inserts `true` only if the flag is set.
    pub fn insert_flag(&mut self, key: &str, flag: bool) {
        if flag {
            self.insert(key, true);
        }
    }

    /// Inserts a list of strings only if it is non-empty.
    pub fn insert_list(&mut self, key: &str, values: &[String]) {
        if !values.is_empty() {
            self.insert(key, values.to_vec());
        }
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the field names in serialization order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the payload has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serializes the payload to compact JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if a value cannot be encoded.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.0)
    }

    /// Consumes the payload and returns the underlying map.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}
