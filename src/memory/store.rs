//! One tier's entries in memory, mirrored to a durable JSON file.
//!
//! [`TierStore`] owns an insertion-ordered sequence guarded by a single
//! mutex. Every mutation holds that lock through the durable write, so a
//! snapshot never observes a half-written file. Capacity overflow evicts
//! from the head (oldest insertion) FIFO-style.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{info, warn};

use super::error::MemoryError;
use super::types::{MemoryEntry, Tier};

pub struct TierStore {
    tier: Tier,
    path: PathBuf,
    capacity: usize,
    entries: Mutex<Vec<MemoryEntry>>,
}

impl TierStore {
    /// Open a tier store backed by `path`.
    ///
    /// A missing file initializes an empty store and persists it immediately
    /// (idempotent bootstrap). A file that fails to parse logs a warning and
    /// resets to empty rather than failing startup — data loss is accepted
    /// over unavailability. Individual malformed records are skipped.
    pub fn open(
        tier: Tier,
        path: impl Into<PathBuf>,
        capacity: usize,
    ) -> Result<Self, MemoryError> {
        let path = path.into();
        let store = Self {
            tier,
            path,
            capacity,
            entries: Mutex::new(Vec::new()),
        };
        store.load()?;
        Ok(store)
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert at the tail, evict from the head past capacity, then save
    /// durably before returning. On a failed save the in-memory effect is
    /// kept and the error is surfaced for the caller to log or retry.
    pub fn append(&self, entry: MemoryEntry) -> Result<(), MemoryError> {
        let mut entries = self.lock();
        entries.push(entry);
        evict_overflow(&mut entries, self.capacity, self.tier);
        self.persist_locked(&entries)
    }

    /// Insert without the durable write. Used by the journaled write path,
    /// where persistence follows through the tier's write queue.
    pub fn stage(&self, entry: MemoryEntry) {
        let mut entries = self.lock();
        entries.push(entry);
        evict_overflow(&mut entries, self.capacity, self.tier);
    }

    /// Remove and return the entry with `id`, persisting the shrunken tier.
    /// The removal sticks even if the save fails.
    pub fn remove_by_id(&self, id: &str) -> Result<MemoryEntry, MemoryError> {
        let mut entries = self.lock();
        let pos = entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| MemoryError::NotFound(id.to_string()))?;
        let removed = entries.remove(pos);
        if let Err(e) = self.persist_locked(&entries) {
            warn!(tier = %self.tier, error = %e, "save after removal failed; retrying on next write");
        }
        Ok(removed)
    }

    /// Replace an entry's content in place, preserving every other field.
    pub fn replace_content(&self, id: &str, new_content: &str) -> Result<(), MemoryError> {
        let mut entries = self.lock();
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| MemoryError::NotFound(id.to_string()))?;
        entry.content = new_content.to_string();
        self.persist_locked(&entries)
    }

    /// Read-only copy of the current contents, taken under the tier lock.
    pub fn snapshot(&self) -> Vec<MemoryEntry> {
        self.lock().clone()
    }

    /// Remove and return every entry, persisting the now-empty tier.
    /// Used by the migration pass. The drain sticks even if the save fails,
    /// and the batch is returned either way — it must not be dropped.
    pub fn drain_all(&self) -> Vec<MemoryEntry> {
        let mut entries = self.lock();
        let drained = std::mem::take(&mut *entries);
        if let Err(e) = self.persist_locked(&entries) {
            warn!(tier = %self.tier, error = %e, "save after drain failed; retrying on next write");
        }
        drained
    }

    /// Append a batch at the tail (insertion order preserved), evicting
    /// overflow FIFO. Used as the migration target.
    pub fn extend(&self, batch: Vec<MemoryEntry>) -> Result<(), MemoryError> {
        let mut entries = self.lock();
        entries.extend(batch);
        evict_overflow(&mut entries, self.capacity, self.tier);
        self.persist_locked(&entries)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Write the current contents to the tier file.
    pub fn persist(&self) -> Result<(), MemoryError> {
        let entries = self.lock();
        self.persist_locked(&entries)
    }

    /// Read the tier file into memory, replacing current contents.
    pub fn load(&self) -> Result<(), MemoryError> {
        let mut entries = self.lock();

        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                entries.clear();
                info!(tier = %self.tier, path = %self.path.display(), "no tier file; bootstrapping empty store");
                return self.persist_locked(&entries);
            }
            Err(e) => {
                return Err(MemoryError::Persistence {
                    path: self.path.display().to_string(),
                    source: e,
                })
            }
        };

        let records: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!(tier = %self.tier, path = %self.path.display(), error = %e,
                    "tier file unparseable; resetting to empty store");
                entries.clear();
                return Ok(());
            }
        };

        let mut loaded = Vec::with_capacity(records.len());
        for record in records {
            match MemoryEntry::from_record(record) {
                Ok(entry) => loaded.push(entry),
                Err(e) => warn!(tier = %self.tier, error = %e, "skipping malformed record"),
            }
        }
        info!(tier = %self.tier, count = loaded.len(), "tier loaded");
        *entries = loaded;
        Ok(())
    }

    fn persist_locked(&self, entries: &[MemoryEntry]) -> Result<(), MemoryError> {
        let records: Vec<serde_json::Value> = entries.iter().map(|e| e.to_record()).collect();
        let bytes = serde_json::to_vec_pretty(&records).expect("records serialize");
        std::fs::write(&self.path, bytes).map_err(|e| MemoryError::Persistence {
            path: self.path.display().to_string(),
            source: e,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<MemoryEntry>> {
        // A poisoned tier lock means a panic mid-mutation; the sequence
        // itself is still valid, so keep serving it.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn evict_overflow(entries: &mut Vec<MemoryEntry>, capacity: usize, tier: Tier) {
    while entries.len() > capacity {
        let evicted = entries.remove(0);
        info!(tier = %tier, id = %evicted.id, "capacity reached; evicting oldest entry");
    }
}
