//! Consumer loop
//!
//! ```text
//!  StartupDelay ──► Polling ──► Processing ──┐
//!                    ▲  │ empty              │
//!                    │  ▼                    │
//!                    └──┴────────────────────┘
//!                    │ transport failure        │ store failure (Halt)
//!                    ▼                          ▼
//!                  Error                      Halted
//! ```
//!
//! The cursor is threaded through `poll_once` by value. It only moves past
//! an entry once that entry's row is stored, and the checkpoint is saved
//! right after, so a restart never skips a stored-but-unacknowledged entry.
//! It may redeliver one whose checkpoint save failed; the store accepts
//! such duplicates.

use chrono::Utc;
use fix_codec::decode;
use fix_types::ids::StreamEntryId;
use fix_types::record::{RawRecord, StoredRecord};
use persistence::checkpoint::CheckpointManager;
use persistence::store::{RecordStore, StoreError};
use std::future::Future;
use stream::{StreamEntry, Transport, TransportError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::{ConsumerConfig, PersistFailurePolicy};

#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("Failed to persist entry {id}: {source}")]
    Persistence {
        id: StreamEntryId,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    StartupDelay,
    Polling,
    Processing,
    /// Transport failed; terminal.
    Error,
    /// A record could not be stored under the halt policy; terminal.
    Halted,
    /// Shutdown requested between cycles.
    Stopped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub entries_processed: u64,
    pub persistence_failures: u64,
    pub checkpoint_failures: u64,
    pub empty_polls: u64,
}

pub struct StreamConsumer<T: Transport, S: RecordStore> {
    transport: T,
    store: S,
    checkpoints: CheckpointManager,
    config: ConsumerConfig,
    state: ConsumerState,
    stats: ConsumerStats,
}

impl<T: Transport, S: RecordStore> StreamConsumer<T, S> {
    pub fn new(
        transport: T,
        store: S,
        checkpoints: CheckpointManager,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            transport,
            store,
            checkpoints,
            config,
            state: ConsumerState::StartupDelay,
            stats: ConsumerStats::default(),
        }
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    pub fn stats(&self) -> ConsumerStats {
        self.stats
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Cursor to start from: the stored checkpoint, or the start of the log.
    pub fn resume_cursor(&mut self) -> StreamEntryId {
        self.checkpoints.load()
    }

    /// One read and, if anything arrived, one processing pass.
    /// Returns the cursor to use next.
    pub async fn poll_once(&mut self, cursor: StreamEntryId) -> Result<StreamEntryId, ConsumerError> {
        self.state = ConsumerState::Polling;
        let read = self
            .transport
            .read(cursor, self.config.batch_size, self.config.block_timeout)
            .await;
        self.handle_read(cursor, read)
    }

    /// Run until a terminal failure.
    pub async fn run(&mut self) -> Result<(), ConsumerError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run until `shutdown` resolves or a terminal failure.
    ///
    /// Shutdown is only observed while waiting (startup delay or a blocking
    /// read); a batch that has been read is always processed to the end.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), ConsumerError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        self.state = ConsumerState::StartupDelay;
        info!(
            delay_ms = self.config.startup_delay.as_millis() as u64,
            "Waiting before first poll"
        );
        let delayed = tokio::select! {
            _ = tokio::time::sleep(self.config.startup_delay) => true,
            _ = &mut shutdown => false,
        };
        if !delayed {
            self.stop();
            return Ok(());
        }

        let mut cursor = self.resume_cursor();
        info!(cursor = %cursor, batch_size = self.config.batch_size, "Consumer started");

        loop {
            self.state = ConsumerState::Polling;
            let read = tokio::select! {
                read = self.transport.read(cursor, self.config.batch_size, self.config.block_timeout) => Some(read),
                _ = &mut shutdown => None,
            };
            match read {
                Some(read) => cursor = self.handle_read(cursor, read)?,
                None => {
                    self.stop();
                    return Ok(());
                }
            }
        }
    }

    fn stop(&mut self) {
        self.state = ConsumerState::Stopped;
        info!(
            processed = self.stats.entries_processed,
            checkpoint = ?self.checkpoints.last_saved().map(|id| id.to_string()),
            "Consumer stopped"
        );
    }

    fn handle_read(
        &mut self,
        cursor: StreamEntryId,
        read: Result<Vec<StreamEntry>, TransportError>,
    ) -> Result<StreamEntryId, ConsumerError> {
        let entries = match read {
            Ok(entries) => entries,
            Err(e) => {
                self.state = ConsumerState::Error;
                error!(cursor = %cursor, error = %e, "Stream read failed");
                return Err(e.into());
            }
        };

        if entries.is_empty() {
            self.stats.empty_polls += 1;
            debug!(cursor = %cursor, "Waiting for new messages");
            return Ok(cursor);
        }

        self.state = ConsumerState::Processing;
        let mut cursor = cursor;
        for entry in &entries {
            cursor = self.process_entry(cursor, entry)?;
        }
        self.state = ConsumerState::Polling;
        Ok(cursor)
    }

    fn process_entry(
        &mut self,
        cursor: StreamEntryId,
        entry: &StreamEntry,
    ) -> Result<StreamEntryId, ConsumerError> {
        let raw = RawRecord::from_bytes(&entry.payload);
        let fields = decode(raw.as_str());
        let record = StoredRecord::from_fields(entry.id, &fields, &raw, Utc::now());

        if let Err(e) = self.store.store(&record) {
            self.stats.persistence_failures += 1;
            return match self.config.persist_failure_policy {
                PersistFailurePolicy::Halt => {
                    self.state = ConsumerState::Halted;
                    error!(
                        id = %entry.id,
                        checkpoint = %cursor,
                        error = %e,
                        "Failed to store record, halting"
                    );
                    Err(ConsumerError::Persistence {
                        id: entry.id,
                        source: e,
                    })
                }
                PersistFailurePolicy::Skip => {
                    error!(id = %entry.id, error = %e, "Failed to store record, skipping entry");
                    Ok(entry.id)
                }
            };
        }

        self.stats.entries_processed += 1;
        debug!(
            id = %entry.id,
            msg_type = record.msg_type.as_deref().unwrap_or(""),
            symbol = record.symbol.as_deref().unwrap_or(""),
            "Stored record"
        );

        if let Err(e) = self.checkpoints.save(entry.id) {
            self.stats.checkpoint_failures += 1;
            warn!(id = %entry.id, error = %e, "Failed to save checkpoint");
        }
        Ok(entry.id)
    }
}
