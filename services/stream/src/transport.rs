//! Transport trait and the entry type it carries

use async_trait::async_trait;
use fix_types::ids::StreamEntryId;
use persistence::journal::JournalError;
use persistence::reader::ReaderError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    /// The log cannot be reached (connection refused, lost, timed out).
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    /// The log answered with something this client cannot use.
    #[error("transport protocol error: {0}")]
    Protocol(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("journal recovery failed: {0}")]
    Recovery(#[from] ReaderError),
}

/// One entry of the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: StreamEntryId,
    pub payload: Vec<u8>,
}

impl StreamEntry {
    pub fn new(id: StreamEntryId, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }
}

/// Ordered append-only log.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Append `payload` and return the id the log assigned to it. The entry
    /// is visible to reads as soon as this returns.
    async fn publish(&self, payload: &[u8]) -> Result<StreamEntryId, TransportError>;

    /// Up to `max_count` entries with ids strictly greater than `after`, in
    /// log order and without gaps.
    ///
    /// Returns immediately when such entries exist; otherwise waits up to
    /// `timeout` and returns an empty vector when it expires. A `max_count`
    /// of zero is read as one.
    async fn read(
        &self,
        after: StreamEntryId,
        max_count: usize,
        timeout: Duration,
    ) -> Result<Vec<StreamEntry>, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn publish(&self, payload: &[u8]) -> Result<StreamEntryId, TransportError> {
        (**self).publish(payload).await
    }

    async fn read(
        &self,
        after: StreamEntryId,
        max_count: usize,
        timeout: Duration,
    ) -> Result<Vec<StreamEntry>, TransportError> {
        (**self).read(after, max_count, timeout).await
    }
}
