//! JSON shapes of the stream HTTP API, shared by the gateway and the client
//!
//! Payloads travel as JSON strings, so only UTF-8 payloads cross the wire.

use fix_types::ids::StreamEntryId;
use serde::{Deserialize, Serialize};

use crate::transport::{StreamEntry, TransportError};

/// Longest blocking read the server will honour.
pub const MAX_BLOCK_MS: u64 = 30_000;

pub const DEFAULT_READ_COUNT: usize = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishResponse {
    pub id: StreamEntryId,
}

/// Query string of `GET /v1/stream/entries`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadQuery {
    pub after: Option<String>,
    pub count: Option<usize>,
    pub block_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResponse {
    pub entries: Vec<WireEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEntry {
    pub id: StreamEntryId,
    pub payload: String,
}

impl WireEntry {
    pub fn from_entry(entry: &StreamEntry) -> Result<Self, TransportError> {
        let payload = std::str::from_utf8(&entry.payload)
            .map_err(|e| TransportError::InvalidPayload(format!("entry {}: {}", entry.id, e)))?;
        Ok(Self {
            id: entry.id,
            payload: payload.to_string(),
        })
    }

    pub fn into_entry(self) -> StreamEntry {
        StreamEntry::new(self.id, self.payload.into_bytes())
    }
}
