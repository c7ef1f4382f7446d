//! Record types flowing through the pipeline
//!
//! A `RawRecord` is read from the stream, decoded into a `FieldMap`, and
//! projected into a `StoredRecord` for the record store.

use crate::ids::{RecordId, StreamEntryId};
use crate::tags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One undecoded message payload.
///
/// The transport carries bytes; the pipeline treats a record as text and
/// replaces invalid UTF-8 sequences rather than rejecting the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(String);

impl RawRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Build a record from transport bytes, replacing invalid UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RawRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RawRecord {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RawRecord {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Decoded tag → value mapping of one record.
///
/// Tags are unique; inserting an existing tag replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(HashMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Insert a field, returning the value it replaced.
    pub fn insert(&mut self, tag: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(tag.into(), value.into())
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Decoded fields in first-seen order.
///
/// A repeated tag keeps its original position but takes the later value,
/// so the content matches `FieldMap` while the order follows the message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedFields(Vec<(String, String)>);

impl OrderedFields {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn insert(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        let tag = tag.into();
        let value = value.into();
        match self.0.iter_mut().find(|(t, _)| *t == tag) {
            Some(slot) => slot.1 = value,
            None => self.0.push((tag, value)),
        }
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_field_map(self) -> FieldMap {
        self.0.into_iter().collect()
    }
}

/// Durable projection of one decoded record.
///
/// Created once by the consumer loop and never mutated afterwards. Business
/// fields stay as the raw strings from the message; interpretation (numeric
/// parsing, side codes) happens at report time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    /// Stream entry this record was decoded from
    pub stream_id: StreamEntryId,
    pub msg_type: Option<String>,
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub order_qty: Option<String>,
    pub price: Option<String>,
    pub sender_comp_id: Option<String>,
    pub target_comp_id: Option<String>,
    pub sending_time: Option<String>,
    pub raw_message: String,
    pub received_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Project the business fields of a decoded record.
    pub fn from_fields(
        stream_id: StreamEntryId,
        fields: &FieldMap,
        raw: &RawRecord,
        received_at: DateTime<Utc>,
    ) -> Self {
        let field = |tag: &str| fields.get(tag).map(str::to_string);
        Self {
            id: RecordId::new(),
            stream_id,
            msg_type: field(tags::MSG_TYPE),
            symbol: field(tags::SYMBOL),
            side: field(tags::SIDE),
            order_qty: field(tags::ORDER_QTY),
            price: field(tags::PRICE),
            sender_comp_id: field(tags::SENDER_COMP_ID),
            target_comp_id: field(tags::TARGET_COMP_ID),
            sending_time: field(tags::SENDING_TIME),
            raw_message: raw.as_str().to_string(),
            received_at,
        }
    }
}
