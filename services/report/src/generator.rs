//! Report generation against a record store
//!
//! The artifact is replaced atomically (write a private temp file, fsync,
//! rename, fsync the directory), so a reader never sees a partial report and
//! a failed run leaves the previous one in place.

use chrono::{Local, NaiveDateTime};
use persistence::checkpoint::sync_parent_dir;
use persistence::store::{RecordStore, StoreError};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{error, info};

use crate::render::render;
use crate::snapshot::ReportSnapshot;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report query failed: {0}")]
    Query(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Report not found at {}", .0.display())]
    NotFound(PathBuf),
}

#[derive(Clone)]
pub struct ReportGenerator {
    store: Arc<dyn RecordStore>,
}

impl ReportGenerator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Aggregates over the store as of now, without writing anything.
    pub fn snapshot(&self) -> Result<ReportSnapshot, ReportError> {
        let records = self.store.scan().map_err(|e| {
            error!(error = %e, "Report query failed");
            ReportError::Query(e)
        })?;
        Ok(ReportSnapshot::compute(&records))
    }

    /// Generate the report stamped with the current local time.
    pub fn generate(&self, path: &Path) -> Result<ReportSnapshot, ReportError> {
        self.generate_at(path, Local::now().naive_local())
    }

    pub fn generate_at(
        &self,
        path: &Path,
        generated_at: NaiveDateTime,
    ) -> Result<ReportSnapshot, ReportError> {
        let snapshot = self.snapshot()?;
        let text = render(&snapshot, generated_at);
        write_atomic(path, text.as_bytes())?;

        info!(
            path = %path.display(),
            total = snapshot.total,
            symbols = snapshot.unique_symbols,
            "Report written"
        );
        Ok(snapshot)
    }

    /// Current artifact text.
    pub fn read(path: &Path) -> Result<String, ReportError> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ReportError::NotFound(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    // One temp file per run: concurrent generations never share it
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    sync_parent_dir(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use fix_types::ids::StreamEntryId;
    use fix_types::record::{FieldMap, RawRecord, StoredRecord};
    use persistence::store::MemoryStore;
    use tempfile::TempDir;

    struct FailingStore;

    impl RecordStore for FailingStore {
        fn store(&self, _record: &StoredRecord) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }

        fn scan(&self) -> Result<Vec<StoredRecord>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
    }

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn order(seq: u64, side: &str, qty: &str, price: &str) -> StoredRecord {
        let fields: FieldMap = [
            ("35", "D"),
            ("55", "AAPL"),
            ("54", side),
            ("38", qty),
            ("44", price),
        ]
        .into_iter()
        .collect();
        StoredRecord::from_fields(
            StreamEntryId::new(1, seq),
            &fields,
            &RawRecord::new("8=FIX.4.4|35=D"),
            Utc::now(),
        )
    }

    fn aapl_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.store(&order(1, "1", "100", "150.00")).unwrap();
        store.store(&order(2, "2", "200", "151.00")).unwrap();
        store.store(&order(3, "1", "300", "152.00")).unwrap();
        store
    }

    #[test]
    fn test_generate_writes_artifact() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reports/fix_report.txt");
        let generator = ReportGenerator::new(aapl_store());

        let snapshot = generator.generate_at(&path, at()).unwrap();
        assert_eq!(snapshot.total, 3);

        let text = ReportGenerator::read(&path).unwrap();
        assert!(text.contains("Generated: 2024-03-01T12:00:00\n"));
        assert!(text.contains("1. AAPL — 600 shares — Avg Price: 151.00\n"));
        assert!(text.contains("- BUY : 66.7%\n"));
        assert!(text.contains("- SELL : 33.3%\n"));
        assert!(text.contains("- MISSING : 0.0%\n"));
        assert!(text.contains("- D : 3\n"));
        let leftovers = fs::read_dir(tmp.path().join("reports")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_concurrent_generations_never_expose_partial_report() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("reports/fix_report.txt");
        let store = Arc::new(MemoryStore::new());
        for seq in 0..500 {
            let side = if seq % 2 == 0 { "1" } else { "2" };
            store.store(&order(seq, side, "10", "100.5")).unwrap();
        }
        let generator = ReportGenerator::new(store);
        generator.generate_at(&path, at()).unwrap();
        let expected = ReportGenerator::read(&path).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let generator = generator.clone();
                let path = path.clone();
                scope.spawn(move || {
                    for _ in 0..25 {
                        generator.generate_at(&path, at()).unwrap();
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..200 {
                    assert_eq!(ReportGenerator::read(&path).unwrap(), expected);
                }
            });
        });

        let leftovers = fs::read_dir(tmp.path().join("reports")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_same_population_same_report() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fix_report.txt");
        let generator = ReportGenerator::new(aapl_store());

        generator.generate_at(&path, at()).unwrap();
        let first = ReportGenerator::read(&path).unwrap();
        generator.generate_at(&path, at()).unwrap();
        assert_eq!(ReportGenerator::read(&path).unwrap(), first);
    }

    #[test]
    fn test_query_failure_keeps_previous_report() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fix_report.txt");
        ReportGenerator::new(aapl_store()).generate_at(&path, at()).unwrap();
        let before = ReportGenerator::read(&path).unwrap();

        let failing = ReportGenerator::new(Arc::new(FailingStore));
        assert!(matches!(
            failing.generate_at(&path, at()),
            Err(ReportError::Query(_))
        ));
        assert_eq!(ReportGenerator::read(&path).unwrap(), before);
    }

    #[test]
    fn test_read_missing_report() {
        let tmp = TempDir::new().unwrap();
        let result = ReportGenerator::read(&tmp.path().join("nope.txt"));
        assert!(matches!(result, Err(ReportError::NotFound(_))));
    }
}
