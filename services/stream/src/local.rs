//! In-process transport, optionally backed by the on-disk stream journal
//!
//! Entries live in an in-memory index sorted by id. With a journal attached,
//! every publish is appended and fsynced before the entry enters the index,
//! so readers only ever see durable entries. Blocked readers are woken
//! through a `Notify` after each publish.

use async_trait::async_trait;
use fix_types::ids::StreamEntryId;
use persistence::journal::{JournalConfig, JournalEntry, JournalWriter};
use persistence::reader::{repair_tail, JournalReader};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::id_gen::IdGenerator;
use crate::transport::{StreamEntry, Transport, TransportError};

struct LogState {
    entries: Vec<StreamEntry>,
    ids: IdGenerator,
    journal: Option<JournalWriter>,
}

pub struct LocalTransport {
    state: Mutex<LogState>,
    notify: Notify,
}

impl LocalTransport {
    /// Volatile log; contents are lost when the value is dropped.
    pub fn in_memory() -> Self {
        Self::from_state(LogState {
            entries: Vec::new(),
            ids: IdGenerator::new(),
            journal: None,
        })
    }

    /// Durable log backed by the journal in `config.dir`.
    ///
    /// Existing entries are replayed into the index. A partial frame left
    /// at the end of the newest segment by a crash is truncated first.
    pub fn open_journal(config: JournalConfig) -> Result<Self, TransportError> {
        repair_tail(&config.dir)?;

        let recovered = JournalReader::open(&config.dir)?.read_all()?;
        let last = recovered
            .last()
            .map(|e| e.id)
            .unwrap_or(StreamEntryId::START);

        let mut writer = JournalWriter::open(config)?;
        if !last.is_start() {
            writer.set_last_id(last);
        }

        info!(
            entries = recovered.len(),
            last_id = %last,
            "Stream journal opened"
        );

        let entries = recovered
            .into_iter()
            .map(|e| StreamEntry::new(e.id, e.payload))
            .collect();

        Ok(Self::from_state(LogState {
            entries,
            ids: IdGenerator::resume_after(last),
            journal: Some(writer),
        }))
    }

    fn from_state(state: LogState) -> Self {
        Self {
            state: Mutex::new(state),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LogState>, TransportError> {
        self.state
            .lock()
            .map_err(|_| TransportError::Unavailable("stream log lock poisoned".into()))
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Newest id in the log, or the start sentinel when empty.
    pub fn last_id(&self) -> StreamEntryId {
        self.lock()
            .ok()
            .and_then(|s| s.entries.last().map(|e| e.id))
            .unwrap_or(StreamEntryId::START)
    }

    fn collect_after(
        &self,
        after: StreamEntryId,
        max_count: usize,
    ) -> Result<Vec<StreamEntry>, TransportError> {
        let state = self.lock()?;
        let start = state.entries.partition_point(|e| e.id <= after);
        Ok(state.entries[start..]
            .iter()
            .take(max_count)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn publish(&self, payload: &[u8]) -> Result<StreamEntryId, TransportError> {
        let id = {
            let mut state = self.lock()?;
            let id = state.ids.next_id();
            if let Some(journal) = state.journal.as_mut() {
                journal.append(&JournalEntry::new(id, payload.to_vec()))?;
            }
            state.entries.push(StreamEntry::new(id, payload));
            id
        };

        debug!(id = %id, bytes = payload.len(), "Entry published");
        self.notify.notify_waiters();
        Ok(id)
    }

    async fn read(
        &self,
        after: StreamEntryId,
        max_count: usize,
        timeout: Duration,
    ) -> Result<Vec<StreamEntry>, TransportError> {
        let max_count = max_count.max(1);
        let deadline = Instant::now() + timeout;

        loop {
            // Register interest before looking, so a publish landing between
            // the check and the wait still wakes us.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let batch = self.collect_after(after, max_count)?;
            if !batch.is_empty() {
                return Ok(batch);
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    const LONG: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_publish_assigns_increasing_ids() {
        let log = LocalTransport::in_memory();
        let a = log.publish(b"35=D").await.unwrap();
        let b = log.publish(b"35=8").await.unwrap();
        assert!(a > StreamEntryId::START);
        assert!(b > a);
        assert_eq!(log.len(), 2);
        assert_eq!(log.last_id(), b);
    }

    #[tokio::test]
    async fn test_read_after_cursor_is_contiguous() {
        let log = LocalTransport::in_memory();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(log.publish(format!("11={}", i).as_bytes()).await.unwrap());
        }

        let batch = log.read(ids[1], 10, LONG).await.unwrap();
        let got: Vec<_> = batch.iter().map(|e| e.id).collect();
        assert_eq!(got, ids[2..].to_vec());
        assert_eq!(batch[0].payload, b"11=2".to_vec());
    }

    #[tokio::test]
    async fn test_read_respects_max_count() {
        let log = LocalTransport::in_memory();
        for i in 0..5 {
            log.publish(format!("11={}", i).as_bytes()).await.unwrap();
        }
        let batch = log.read(StreamEntryId::START, 2, LONG).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].payload, b"11=1".to_vec());

        let zero = log.read(StreamEntryId::START, 0, LONG).await.unwrap();
        assert_eq!(zero.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_times_out_empty() {
        let log = LocalTransport::in_memory();
        let started = Instant::now();
        let batch = log
            .read(StreamEntryId::START, 1, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(batch.is_empty());
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_at_head_times_out_empty() {
        let log = LocalTransport::in_memory();
        let id = log.publish(b"35=D").await.unwrap();
        let batch = log.read(id, 1, Duration::from_millis(500)).await.unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_reader_wakes_on_publish() {
        let log = Arc::new(LocalTransport::in_memory());

        let reader = {
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                let started = Instant::now();
                let batch = log.read(StreamEntryId::START, 1, LONG).await.unwrap();
                (batch, started.elapsed())
            })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        let id = log.publish(b"35=D|55=AAPL").await.unwrap();

        let (batch, waited) = reader.await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, id);
        assert!(waited < LONG);
    }

    #[tokio::test]
    async fn test_independent_readers_see_same_entries() {
        let log = LocalTransport::in_memory();
        log.publish(b"a").await.unwrap();
        log.publish(b"b").await.unwrap();

        let first = log.read(StreamEntryId::START, 10, LONG).await.unwrap();
        let second = log.read(StreamEntryId::START, 10, LONG).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn test_journal_survives_restart() {
        let tmp = TempDir::new().unwrap();
        let config = JournalConfig::new(tmp.path());

        let before: Vec<StreamEntryId> = {
            let log = LocalTransport::open_journal(config.clone()).unwrap();
            let mut ids = Vec::new();
            for i in 0..3 {
                ids.push(log.publish(format!("11={}", i).as_bytes()).await.unwrap());
            }
            ids
        };

        let log = LocalTransport::open_journal(config).unwrap();
        let batch = log.read(StreamEntryId::START, 10, LONG).await.unwrap();
        let got: Vec<_> = batch.iter().map(|e| e.id).collect();
        assert_eq!(got, before);

        let next = log.publish(b"11=3").await.unwrap();
        assert!(next > before[2]);
    }

    #[tokio::test]
    async fn test_journal_recovers_from_torn_tail() {
        use std::io::Write;

        let tmp = TempDir::new().unwrap();
        let config = JournalConfig::new(tmp.path());
        let kept = {
            let log = LocalTransport::open_journal(config.clone()).unwrap();
            log.publish(b"11=0").await.unwrap()
        };

        let segment = tmp.path().join("stream-000000.log");
        let mut file = std::fs::OpenOptions::new().append(true).open(&segment).unwrap();
        file.write_all(&[40, 0, 0, 0, 1, 2]).unwrap();
        drop(file);

        let log = LocalTransport::open_journal(config).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.last_id(), kept);

        let next = log.publish(b"11=1").await.unwrap();
        let batch = log.read(kept, 10, LONG).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, next);
    }
}
