//! Terminal archive tier — append-only, one JSON file per calendar day.
//!
//! Entries land here verbatim when their decayed score falls to the archive
//! threshold. They are never rescored or migrated further; the files exist
//! purely for audit and history.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use super::error::MemoryError;
use super::types::MemoryEntry;

pub struct ArchiveStore {
    dir: PathBuf,
    // Serializes the read-modify-write of the day file.
    io: Mutex<()>,
}

impl ArchiveStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, MemoryError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| MemoryError::Persistence {
            path: dir.display().to_string(),
            source: e,
        })?;
        Ok(Self {
            dir,
            io: Mutex::new(()),
        })
    }

    /// Append one entry to today's archive file.
    pub fn append(&self, entry: &MemoryEntry) -> Result<(), MemoryError> {
        let _guard = self.lock();
        let path = self.file_for(Utc::now().date_naive());

        let mut records = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!(path = %path.display(), error = %e,
                        "archive file unparseable; resetting to empty list");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(MemoryError::Persistence {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };

        records.push(entry.to_record());
        let bytes = serde_json::to_vec_pretty(&records).expect("records serialize");
        std::fs::write(&path, bytes).map_err(|e| MemoryError::Persistence {
            path: path.display().to_string(),
            source: e,
        })?;
        info!(id = %entry.id, path = %path.display(), "entry archived");
        Ok(())
    }

    /// Entries archived on a given day. Malformed records are skipped.
    pub fn read_day(&self, date: NaiveDate) -> Result<Vec<MemoryEntry>, MemoryError> {
        let _guard = self.lock();
        let path = self.file_for(date);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(MemoryError::Persistence {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };
        let records: Vec<serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| MemoryError::MalformedEntry(e.to_string()))?;
        Ok(records
            .into_iter()
            .filter_map(|r| match MemoryEntry::from_record(r) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping malformed archive record");
                    None
                }
            })
            .collect())
    }

    /// Number of day files present.
    pub fn day_count(&self) -> usize {
        let _guard = self.lock();
        std::fs::read_dir(&self.dir)
            .map(|dir| {
                dir.filter_map(|e| e.ok())
                    .filter(|e| {
                        e.file_name()
                            .to_string_lossy()
                            .strip_prefix("archive-")
                            .and_then(|rest| rest.strip_suffix(".json"))
                            .is_some()
                    })
                    .count()
            })
            .unwrap_or(0)
    }

    fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("archive-{}.json", date.format("%Y-%m-%d")))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.io.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
