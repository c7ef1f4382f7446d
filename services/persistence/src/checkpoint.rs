//! Checkpoint Manager — durable resume cursor for the stream consumer
//!
//! The checkpoint file holds a single line: the text form of the last
//! processed `StreamEntryId`. It is replaced atomically (write tmp, fsync,
//! rename) so a crash mid-save leaves either the old or the new value,
//! never a mix.
//!
//! The manager also refuses to move the cursor backwards: a save lower than
//! the last loaded or saved value is rejected and the file is left alone.

use fix_types::ids::StreamEntryId;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Checkpoint would regress from {current} to {attempted}")]
    Regression {
        current: StreamEntryId,
        attempted: StreamEntryId,
    },
}

/// Loads and saves the consumer checkpoint file.
#[derive(Debug)]
pub struct CheckpointManager {
    path: PathBuf,
    last_saved: Option<StreamEntryId>,
}

impl CheckpointManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_saved: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest value loaded or saved through this manager.
    pub fn last_saved(&self) -> Option<StreamEntryId> {
        self.last_saved
    }

    /// Read the stored cursor.
    ///
    /// Never fails: a missing file means "start of log", and read or parse
    /// errors are logged and treated the same way.
    pub fn load(&mut self) -> StreamEntryId {
        let id = match fs::read_to_string(&self.path) {
            Ok(text) => match text.parse::<StreamEntryId>() {
                Ok(id) => {
                    info!(path = %self.path.display(), id = %id, "Resuming from checkpoint");
                    id
                }
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Unreadable checkpoint, starting from start of log"
                    );
                    StreamEntryId::START
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No checkpoint found, starting from start of log");
                StreamEntryId::START
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to read checkpoint, starting from start of log"
                );
                StreamEntryId::START
            }
        };

        self.last_saved = Some(self.last_saved.map_or(id, |prev| prev.max(id)));
        id
    }

    /// Atomically replace the stored cursor with `id`.
    ///
    /// Saving the current value again is allowed and rewrites the file.
    pub fn save(&mut self, id: StreamEntryId) -> Result<(), CheckpointError> {
        if let Some(current) = self.last_saved {
            if id < current {
                return Err(CheckpointError::Regression {
                    current,
                    attempted: id,
                });
            }
        }

        self.write_atomic(id)?;
        self.last_saved = Some(id);
        debug!(id = %id, "Checkpoint saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_atomic(&self, id: StreamEntryId) -> Result<(), CheckpointError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.tmp_path();
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(id.to_string().as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        sync_parent_dir(&self.path)?;
        Ok(())
    }
}

/// Flush the directory entry of `path` so a completed rename survives power
/// loss. A bare file name refers to the current directory.
#[cfg(unix)]
pub fn sync_parent_dir(path: &Path) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
pub fn sync_parent_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> CheckpointManager {
        CheckpointManager::new(dir.path().join("last_stream_id.txt"))
    }

    #[test]
    fn test_sync_parent_dir() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b/last_stream_id.txt");
        fs::create_dir_all(nested.parent().unwrap()).unwrap();

        sync_parent_dir(&nested).unwrap();
        sync_parent_dir(Path::new("last_stream_id.txt")).unwrap();
        assert!(sync_parent_dir(&tmp.path().join("missing/x.txt")).is_err());
    }

    #[test]
    fn test_missing_file_loads_start() {
        let tmp = TempDir::new().unwrap();
        let mut checkpoints = manager(&tmp);
        assert_eq!(checkpoints.load(), StreamEntryId::START);
    }

    #[test]
    fn test_save_then_load_after_restart() {
        let tmp = TempDir::new().unwrap();
        let id = StreamEntryId::new(1_708_000_000_000, 4);
        {
            let mut checkpoints = manager(&tmp);
            checkpoints.load();
            checkpoints.save(id).unwrap();
        }

        let mut restarted = manager(&tmp);
        assert_eq!(restarted.load(), id);
        assert_eq!(
            fs::read_to_string(tmp.path().join("last_stream_id.txt")).unwrap(),
            "1708000000000-4"
        );
    }

    #[test]
    fn test_garbage_file_loads_start() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("last_stream_id.txt"), "not-an-id").unwrap();
        assert_eq!(manager(&tmp).load(), StreamEntryId::START);
    }

    #[test]
    fn test_load_accepts_trailing_newline() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("last_stream_id.txt"), "12-3\n").unwrap();
        assert_eq!(manager(&tmp).load(), StreamEntryId::new(12, 3));
    }

    #[test]
    fn test_regression_rejected_and_file_untouched() {
        let tmp = TempDir::new().unwrap();
        let mut checkpoints = manager(&tmp);
        checkpoints.save(StreamEntryId::new(10, 0)).unwrap();

        let result = checkpoints.save(StreamEntryId::new(9, 5));
        assert!(matches!(result, Err(CheckpointError::Regression { .. })));
        assert_eq!(manager(&tmp).load(), StreamEntryId::new(10, 0));
    }

    #[test]
    fn test_regression_guard_seeded_by_load() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("last_stream_id.txt"), "50-0").unwrap();

        let mut checkpoints = manager(&tmp);
        checkpoints.load();
        assert!(checkpoints.save(StreamEntryId::new(49, 0)).is_err());
        checkpoints.save(StreamEntryId::new(50, 0)).unwrap();
        checkpoints.save(StreamEntryId::new(50, 1)).unwrap();
        assert_eq!(checkpoints.last_saved(), Some(StreamEntryId::new(50, 1)));
    }

    #[test]
    fn test_leftover_tmp_file_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let mut checkpoints = manager(&tmp);
        checkpoints.save(StreamEntryId::new(5, 0)).unwrap();

        // Crash after writing the tmp file but before the rename
        fs::write(tmp.path().join("last_stream_id.txt.tmp"), "99-").unwrap();

        assert_eq!(manager(&tmp).load(), StreamEntryId::new(5, 0));
        let mut next = manager(&tmp);
        next.load();
        next.save(StreamEntryId::new(6, 0)).unwrap();
        assert_eq!(manager(&tmp).load(), StreamEntryId::new(6, 0));
    }

    #[test]
    fn test_save_creates_parent_dir() {
        let tmp = TempDir::new().unwrap();
        let mut checkpoints = CheckpointManager::new(tmp.path().join("state/cursor.txt"));
        checkpoints.save(StreamEntryId::new(1, 1)).unwrap();
        assert!(tmp.path().join("state/cursor.txt").exists());
    }

    #[test]
    fn test_save_failure_is_reported() {
        let tmp = TempDir::new().unwrap();
        // The checkpoint path is a directory, so the rename cannot succeed
        let path = tmp.path().join("cursor");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), "x").unwrap();

        let mut checkpoints = CheckpointManager::new(&path);
        assert!(matches!(
            checkpoints.save(StreamEntryId::new(1, 0)),
            Err(CheckpointError::Io(_))
        ));
        assert_eq!(checkpoints.last_saved(), None);
    }

    proptest! {
        #[test]
        fn prop_checkpoint_never_regresses(
            saves in proptest::collection::vec((0u64..50, 0u64..5), 1..40),
            crash_at in 0usize..40,
        ) {
            let tmp = TempDir::new().unwrap();
            let mut checkpoints = manager(&tmp);
            checkpoints.load();

            let mut highest_completed: Option<StreamEntryId> = None;
            for (millis, seq) in saves.iter().take(crash_at) {
                let id = StreamEntryId::new(*millis, *seq);
                if checkpoints.save(id).is_ok() {
                    highest_completed = Some(highest_completed.map_or(id, |h| h.max(id)));
                }
            }
            drop(checkpoints);

            let loaded = manager(&tmp).load();
            match highest_completed {
                Some(high) => prop_assert_eq!(loaded, high),
                None => prop_assert_eq!(loaded, StreamEntryId::START),
            }
        }
    }
}
