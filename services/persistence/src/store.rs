//! Record store — where decoded records end up
//!
//! `RecordStore` is the narrow repository seam between the consumer loop and
//! whatever engine keeps the rows: a single-row insert for the writer and a
//! point-in-time scan for the report engine. Redelivered stream entries may
//! produce duplicate rows; stores do not deduplicate.

use fix_types::record::StoredRecord;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Storage for decoded records.
pub trait RecordStore: Send + Sync {
    /// Insert one record.
    fn store(&self, record: &StoredRecord) -> Result<(), StoreError>;

    /// Every stored record, in insertion order, as of the call.
    fn scan(&self) -> Result<Vec<StoredRecord>, StoreError>;

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.scan()?.len())
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn store(&self, record: &StoredRecord) -> Result<(), StoreError> {
        (**self).store(record)
    }

    fn scan(&self) -> Result<Vec<StoredRecord>, StoreError> {
        (**self).scan()
    }

    fn count(&self) -> Result<usize, StoreError> {
        (**self).count()
    }
}

// ── In-memory store ─────────────────────────────────────────────────

/// Volatile store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<StoredRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl RecordStore for MemoryStore {
    fn store(&self, record: &StoredRecord) -> Result<(), StoreError> {
        self.lock()?.push(record.clone());
        Ok(())
    }

    fn scan(&self) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }
}

// ── JSON-lines file store ───────────────────────────────────────────

/// Durable store writing one JSON object per line.
///
/// Each insert is appended and fsynced before returning. Readers may run in
/// other processes while the consumer appends; a final line that does not
/// parse (an append in progress, or one torn by a crash) is skipped.
#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
    writer: Mutex<Option<File>>,
}

impl JsonlStore {
    /// Open (or lazily create) the store file. The parent directory is
    /// created if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path,
            writer: Mutex::new(None),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_line(&self, line: &[u8]) -> Result<(), StoreError> {
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| StoreError::Unavailable("store writer lock poisoned".into()))?;

        if guard.is_none() {
            trim_partial_line(&self.path)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            *guard = Some(file);
        }

        if let Some(file) = guard.as_mut() {
            let result = file
                .write_all(line)
                .and_then(|_| file.sync_data());
            if let Err(e) = result {
                // Reopen on the next insert rather than reuse a handle in an
                // unknown state.
                *guard = None;
                return Err(e.into());
            }
        }
        Ok(())
    }
}

/// Cut an unterminated final line left by an interrupted append, so the next
/// row starts on a line of its own. Returns the number of bytes removed.
fn trim_partial_line(path: &Path) -> io::Result<u64> {
    const CHUNK: u64 = 4096;

    let mut file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(0);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut last)?;
    if last[0] == b'\n' {
        return Ok(0);
    }

    // Walk backwards to the last newline; everything after it is the torn row.
    let mut keep = 0;
    let mut end = len;
    let mut buf = vec![0u8; CHUNK as usize];
    while end > 0 {
        let start = end.saturating_sub(CHUNK);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;
        if let Some(pos) = chunk.iter().rposition(|&b| b == b'\n') {
            keep = start + pos as u64 + 1;
            break;
        }
        end = start;
    }

    file.set_len(keep)?;
    file.sync_all()?;
    let removed = len - keep;
    warn!(
        path = %path.display(),
        bytes = removed,
        "Truncated incomplete trailing record"
    );
    Ok(removed)
}

impl RecordStore for JsonlStore {
    fn store(&self, record: &StoredRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.append_line(&line)
    }

    fn scan(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let lines: Vec<String> = BufReader::new(file).lines().collect::<Result<_, _>>()?;
        let last = lines.len().saturating_sub(1);

        let mut records = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StoredRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) if idx == last => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Skipping incomplete trailing record"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(records)
    }
}
