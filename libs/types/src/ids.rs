//! Identifier types for the ingestion pipeline
//!
//! `StreamEntryId` is the cursor position inside the stream log. It is
//! assigned by the transport, totally ordered, and persisted as the consumer
//! checkpoint. `RecordId` identifies a stored record and uses UUID v7 so
//! stored rows sort chronologically.

use crate::errors::IdParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Position of one entry in the stream log.
///
/// Text form is `<millis>-<seq>`: the wall-clock millisecond at which the
/// entry was appended and a counter that disambiguates entries appended in
/// the same millisecond. Ordering is lexicographic on `(millis, seq)`, which
/// the derived `Ord` gives us through field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StreamEntryId {
    millis: u64,
    seq: u64,
}

impl StreamEntryId {
    /// Sentinel denoting "start of log"; every real entry sorts after it.
    pub const START: StreamEntryId = StreamEntryId { millis: 0, seq: 0 };

    pub const fn new(millis: u64, seq: u64) -> Self {
        Self { millis, seq }
    }

    pub fn millis(&self) -> u64 {
        self.millis
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_start(&self) -> bool {
        *self == Self::START
    }

    /// Smallest id strictly greater than `self` within the same millisecond.
    ///
    /// Returns `None` only when the sequence counter is exhausted.
    pub fn successor(&self) -> Option<Self> {
        self.seq.checked_add(1).map(|seq| Self {
            millis: self.millis,
            seq,
        })
    }
}

impl Default for StreamEntryId {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for StreamEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.millis, self.seq)
    }
}

impl FromStr for StreamEntryId {
    type Err = IdParseError;

    /// Parses `<millis>-<seq>`; a bare `<millis>` is read as `<millis>-0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdParseError::Empty);
        }

        let (millis_part, seq_part) = match s.split_once('-') {
            Some((m, q)) => (m, Some(q)),
            None => (s, None),
        };

        let millis = millis_part
            .parse::<u64>()
            .map_err(|_| IdParseError::InvalidMillis(millis_part.to_string()))?;

        let seq = match seq_part {
            Some(q) => q
                .parse::<u64>()
                .map_err(|_| IdParseError::InvalidSequence(q.to_string()))?,
            None => 0,
        };

        Ok(Self { millis, seq })
    }
}

impl TryFrom<String> for StreamEntryId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StreamEntryId> for String {
    fn from(id: StreamEntryId) -> Self {
        id.to_string()
    }
}

/// Unique identifier for a stored record
///
/// Uses UUID v7 so records can be listed in receipt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new RecordId with current timestamp
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
