//! Journal Reader — Sequential reader with corruption detection
//!
//! Features:
//! - Sequential entry reading across all segment files
//! - CRC32C checksum validation on every read
//! - Corruption log with byte-offset reporting
//! - Torn-tail repair: a crash mid-append leaves a partial final frame,
//!   which is cut off so the writer can append cleanly after it
//! - Seeking past a stream cursor

use crate::journal::{list_segments, JournalEntry};
use fix_types::ids::StreamEntryId;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Checksum mismatch at byte offset {offset}: entry id={id}")]
    ChecksumMismatch { offset: u64, id: StreamEntryId },

    #[error("Entry id not increasing: prev={prev}, current={current}")]
    NotIncreasing {
        prev: StreamEntryId,
        current: StreamEntryId,
    },
}

// ── Corruption Log Entry ────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CorruptionRecord {
    pub file: PathBuf,
    /// Byte offset within `file` where the unreadable region starts.
    pub byte_offset: u64,
    pub kind: CorruptionKind,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CorruptionKind {
    ChecksumMismatch,
    TruncatedEntry,
}

/// Outcome of cutting a torn tail off the last segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TailRepair {
    pub file: PathBuf,
    /// Length of the segment after repair.
    pub valid_len: u64,
    pub discarded_bytes: u64,
}

// ── Journal Reader ──────────────────────────────────────────────────

/// Sequential journal reader with checksum validation.
pub struct JournalReader {
    segments: Vec<PathBuf>,
    segment_pos: usize,
    data: Vec<u8>,
    pos: usize,
    last_id: Option<StreamEntryId>,
    corruption_log: Vec<CorruptionRecord>,
}

impl JournalReader {
    /// Open a reader over every segment in `dir`. A missing directory reads
    /// as an empty journal.
    pub fn open(dir: &Path) -> Result<Self, ReaderError> {
        let segments = list_segments(dir)?.into_iter().map(|(_, p)| p).collect();
        let mut reader = Self {
            segments,
            segment_pos: 0,
            data: Vec::new(),
            pos: 0,
            last_id: None,
            corruption_log: Vec::new(),
        };
        reader.load_segment_file()?;
        Ok(reader)
    }

    /// Read the next valid entry.
    ///
    /// Returns `None` once every segment is exhausted. An unparseable frame
    /// skips the remainder of its segment and is recorded in the corruption
    /// log; a checksum mismatch is returned as an error.
    pub fn next_entry(&mut self) -> Result<Option<JournalEntry>, ReaderError> {
        loop {
            if self.pos >= self.data.len() && !self.next_segment()? {
                return Ok(None);
            }

            let offset = self.pos as u64;
            match JournalEntry::from_bytes(&self.data[self.pos..]) {
                Ok((entry, consumed)) => {
                    self.pos += consumed;

                    if !entry.verify_checksum() {
                        self.corruption_log.push(CorruptionRecord {
                            file: self.segment_file(),
                            byte_offset: offset,
                            kind: CorruptionKind::ChecksumMismatch,
                            detail: format!(
                                "CRC32C mismatch for id={}, stored={:#010x}",
                                entry.id, entry.checksum
                            ),
                        });
                        return Err(ReaderError::ChecksumMismatch {
                            offset,
                            id: entry.id,
                        });
                    }

                    if let Some(prev) = self.last_id {
                        if entry.id <= prev {
                            return Err(ReaderError::NotIncreasing {
                                prev,
                                current: entry.id,
                            });
                        }
                    }

                    self.last_id = Some(entry.id);
                    return Ok(Some(entry));
                }
                Err(e) => {
                    self.corruption_log.push(CorruptionRecord {
                        file: self.segment_file(),
                        byte_offset: offset,
                        kind: CorruptionKind::TruncatedEntry,
                        detail: e.to_string(),
                    });
                    self.pos = self.data.len();
                }
            }
        }
    }

    /// Read all remaining entries.
    pub fn read_all(&mut self) -> Result<Vec<JournalEntry>, ReaderError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry()? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Read all entries with an id strictly greater than `after`.
    pub fn read_after(&mut self, after: StreamEntryId) -> Result<Vec<JournalEntry>, ReaderError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry()? {
            if entry.id > after {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    pub fn last_id(&self) -> Option<StreamEntryId> {
        self.last_id
    }

    pub fn corruption_log(&self) -> &[CorruptionRecord] {
        &self.corruption_log
    }

    // ── Internal Helpers ────────────────────────────────────────────

    fn segment_file(&self) -> PathBuf {
        self.segments
            .get(self.segment_pos)
            .cloned()
            .unwrap_or_default()
    }

    fn load_segment_file(&mut self) -> Result<(), ReaderError> {
        self.data.clear();
        self.pos = 0;
        if let Some(path) = self.segments.get(self.segment_pos) {
            self.data = fs::read(path)?;
        }
        Ok(())
    }

    fn next_segment(&mut self) -> Result<bool, ReaderError> {
        if self.segment_pos + 1 >= self.segments.len() {
            self.segment_pos = self.segments.len();
            self.data.clear();
            self.pos = 0;
            return Ok(false);
        }
        self.segment_pos += 1;
        self.load_segment_file()?;
        Ok(true)
    }
}

// ── Torn Tail Repair ────────────────────────────────────────────────

/// Truncate the last segment after its final intact frame.
///
/// Only the newest segment can hold a partial append, so earlier segments
/// are never touched. Returns `None` when the tail was already clean.
pub fn repair_tail(dir: &Path) -> Result<Option<TailRepair>, ReaderError> {
    let segments = list_segments(dir)?;
    let Some((_, path)) = segments.last() else {
        return Ok(None);
    };

    let data = fs::read(path)?;
    let mut pos = 0usize;
    while pos < data.len() {
        match JournalEntry::from_bytes(&data[pos..]) {
            Ok((entry, consumed)) if entry.verify_checksum() => pos += consumed,
            _ => break,
        }
    }

    if pos == data.len() {
        return Ok(None);
    }

    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(pos as u64)?;
    file.sync_all()?;

    let repair = TailRepair {
        file: path.clone(),
        valid_len: pos as u64,
        discarded_bytes: (data.len() - pos) as u64,
    };
    warn!(
        file = %repair.file.display(),
        valid_len = repair.valid_len,
        discarded_bytes = repair.discarded_bytes,
        "Truncated torn journal tail"
    );
    Ok(Some(repair))
}

// ── Tests ───────────────────────────────────────────────────────────
