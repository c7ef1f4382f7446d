//! Journal Writer — Append-only stream journal with checksums
//!
//! Durable backing for the stream log. Each entry is written and fsynced
//! before the transport makes it visible to readers, so a reader can never
//! observe an entry that a crash would lose.
//!
//! # Binary Format (per entry)
//! ```text
//! [body_len:    u32]
//! [millis:      u64]
//! [seq:         u64]
//! [payload_len: u32][payload: bytes]
//! [checksum:    u32]  // CRC32C over millis+seq+payload
//! ```

use crc32c::crc32c;
use fix_types::ids::StreamEntryId;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Smallest possible body: millis + seq + payload_len + checksum.
pub(crate) const MIN_BODY_LEN: usize = 8 + 8 + 4 + 4;

/// Upper bound on a plausible body; larger prefixes are treated as corruption.
pub(crate) const MAX_BODY_LEN: usize = 64 * 1024 * 1024;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed entry: {0}")]
    Malformed(String),

    #[error("Entry id {got} is not after last written id {last}")]
    OutOfOrder {
        last: StreamEntryId,
        got: StreamEntryId,
    },

    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),
}

// ── Journal Entry ───────────────────────────────────────────────────

/// One persisted stream entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub id: StreamEntryId,
    pub payload: Vec<u8>,
    /// CRC32C over (millis ++ seq ++ payload)
    pub checksum: u32,
}

impl JournalEntry {
    /// Create a new entry, computing the checksum.
    pub fn new(id: StreamEntryId, payload: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(id, &payload);
        Self {
            id,
            payload,
            checksum,
        }
    }

    pub fn compute_checksum(id: StreamEntryId, payload: &[u8]) -> u32 {
        let mut buf = Vec::with_capacity(16 + payload.len());
        buf.extend_from_slice(&id.millis().to_le_bytes());
        buf.extend_from_slice(&id.seq().to_le_bytes());
        buf.extend_from_slice(payload);
        crc32c(&buf)
    }

    pub fn verify_checksum(&self) -> bool {
        self.checksum == Self::compute_checksum(self.id, &self.payload)
    }

    /// Serialize to the framed wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body_len = (MIN_BODY_LEN + self.payload.len()) as u32;

        let mut buf = Vec::with_capacity(4 + body_len as usize);
        buf.extend_from_slice(&body_len.to_le_bytes());
        buf.extend_from_slice(&self.id.millis().to_le_bytes());
        buf.extend_from_slice(&self.id.seq().to_le_bytes());
        buf.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf.extend_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    /// Deserialize one frame from the front of `data`.
    ///
    /// Returns `(entry, bytes_consumed)`. The checksum is carried through
    /// unverified; callers decide how to treat a mismatch.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize), JournalError> {
        if data.len() < 4 {
            return Err(JournalError::Malformed(
                "Not enough data for length prefix".into(),
            ));
        }

        let body_len = read_u32(&data[0..4]) as usize;
        if !(MIN_BODY_LEN..=MAX_BODY_LEN).contains(&body_len) {
            return Err(JournalError::Malformed(format!(
                "Implausible body length: {}",
                body_len
            )));
        }

        let total = 4 + body_len;
        if data.len() < total {
            return Err(JournalError::Malformed(format!(
                "Incomplete entry: need {} bytes, have {}",
                total,
                data.len()
            )));
        }

        let body = &data[4..total];
        let millis = read_u64(&body[0..8]);
        let seq = read_u64(&body[8..16]);
        let payload_len = read_u32(&body[16..20]) as usize;

        if 20 + payload_len + 4 != body.len() {
            return Err(JournalError::Malformed(format!(
                "payload_len {} disagrees with body length {}",
                payload_len, body_len
            )));
        }

        let payload = body[20..20 + payload_len].to_vec();
        let checksum = read_u32(&body[20 + payload_len..]);

        Ok((
            Self {
                id: StreamEntryId::new(millis, seq),
                payload,
                checksum,
            },
            total,
        ))
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_le_bytes(buf)
}

// ── Journal Writer Configuration ────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Directory holding the segment files.
    pub dir: PathBuf,
    /// Segment size in bytes before rotating to a new file (default 64 MiB).
    pub max_file_size: u64,
}

impl JournalConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_file_size: 64 * 1024 * 1024,
        }
    }
}

// ── Journal Writer ──────────────────────────────────────────────────

/// Append-only journal writer with checksums and segment rotation. Every
/// append is fsynced before it returns. Entry ids must be strictly increasing.
pub struct JournalWriter {
    config: JournalConfig,
    writer: BufWriter<File>,
    segment_file: PathBuf,
    segment_len: u64,
    segment_index: u64,
    last_id: Option<StreamEntryId>,
}

impl JournalWriter {
    /// Open the latest segment for appending, creating the directory.
    pub fn open(config: JournalConfig) -> Result<Self, JournalError> {
        fs::create_dir_all(&config.dir)?;

        let segment_index = latest_segment_index(&config.dir).unwrap_or(0);
        let segment_file = segment_path(&config.dir, segment_index);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&segment_file)?;
        let segment_len = file.metadata()?.len();

        Ok(Self {
            config,
            writer: BufWriter::new(file),
            segment_file,
            segment_len,
            segment_index,
            last_id: None,
        })
    }

    /// Seed the ordering check with the last id already in the journal.
    pub fn set_last_id(&mut self, id: StreamEntryId) {
        self.last_id = Some(id);
    }

    pub fn last_id(&self) -> Option<StreamEntryId> {
        self.last_id
    }

    pub fn active_segment(&self) -> &Path {
        &self.segment_file
    }

    /// Append an entry and fsync it.
    pub fn append(&mut self, entry: &JournalEntry) -> Result<(), JournalError> {
        if let Some(last) = self.last_id {
            if entry.id <= last {
                return Err(JournalError::OutOfOrder {
                    last,
                    got: entry.id,
                });
            }
        }
        if MIN_BODY_LEN + entry.payload.len() > MAX_BODY_LEN {
            return Err(JournalError::PayloadTooLarge(entry.payload.len()));
        }

        if self.segment_len >= self.config.max_file_size {
            self.rotate()?;
        }

        let bytes = entry.to_bytes();
        self.writer.write_all(&bytes)?;
        self.segment_len += bytes.len() as u64;
        self.sync()?;

        self.last_id = Some(entry.id);
        Ok(())
    }

    /// Force flush + fsync.
    pub fn sync(&mut self) -> Result<(), JournalError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    fn rotate(&mut self) -> Result<(), JournalError> {
        self.sync()?;

        self.segment_index += 1;
        self.segment_file = segment_path(&self.config.dir, self.segment_index);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.segment_file)?;

        self.writer = BufWriter::new(file);
        self.segment_len = 0;
        Ok(())
    }
}

// ── Segment Naming ──────────────────────────────────────────────────

pub(crate) fn segment_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("stream-{:06}.log", index))
}

pub(crate) fn parse_segment_index(name: &str) -> Option<u64> {
    name.strip_prefix("stream-")?
        .strip_suffix(".log")?
        .parse::<u64>()
        .ok()
}

/// All segment files in `dir`, sorted by index.
pub(crate) fn list_segments(dir: &Path) -> io::Result<Vec<(u64, PathBuf)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut segments: Vec<(u64, PathBuf)> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            parse_segment_index(&name).map(|idx| (idx, e.path()))
        })
        .collect();
    segments.sort_by_key(|(idx, _)| *idx);
    Ok(segments)
}

fn latest_segment_index(dir: &Path) -> Option<u64> {
    list_segments(dir)
        .ok()
        .and_then(|segments| segments.last().map(|(idx, _)| *idx))
}

// ── Tests ───────────────────────────────────────────────────────────
