//! Public read/write surface — record, recall, rewrite.
//!
//! [`RetrievalFacade`] is what the chat-turn ingestion path and the prompt
//! composer talk to. Writes land in the requested tier and notify the
//! external [`SemanticIndexer`] best-effort; recall scores the union of the
//! short- and long-term tiers and returns a ranked slice. The archive is
//! never part of recall.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use super::error::MemoryError;
use super::journal::WriteJournal;
use super::maintenance::TierSet;
use super::scoring::{decayed_score, relevance_score};
use super::store::TierStore;
use super::types::{EntryDraft, MemoryEntry, Tier};

/// External vector-search collaborator. Calls are best-effort: failures are
/// logged and never surfaced to the conversational hot path.
pub trait SemanticIndexer: Send + Sync {
    fn index(&self, content: &str, tier: Tier, tags: &BTreeSet<String>)
        -> Result<(), MemoryError>;
}

/// Indexer that records nothing. Used when no vector backend is wired up.
pub struct NullIndexer;

impl SemanticIndexer for NullIndexer {
    fn index(
        &self,
        _content: &str,
        tier: Tier,
        _tags: &BTreeSet<String>,
    ) -> Result<(), MemoryError> {
        debug!(tier = %tier, "no semantic indexer configured; skipping");
        Ok(())
    }
}

/// One ranked recall result.
#[derive(Debug, Clone)]
pub struct RecallHit {
    pub score: f64,
    pub entry: MemoryEntry,
}

/// Per-tier entry counts for the stats surface.
#[derive(Debug)]
pub struct TierStats {
    pub short: usize,
    pub long: usize,
    pub archive_days: usize,
}

struct Journals {
    short: WriteJournal,
    long: WriteJournal,
}

pub struct RetrievalFacade {
    tiers: TierSet,
    indexer: Arc<dyn SemanticIndexer>,
    archive_threshold: f64,
    journals: Option<Journals>,
}

impl RetrievalFacade {
    /// Facade with the synchronous write path: every `record` saves durably
    /// before returning.
    pub fn new(tiers: TierSet, indexer: Arc<dyn SemanticIndexer>, archive_threshold: f64) -> Self {
        Self {
            tiers,
            indexer,
            archive_threshold,
            journals: None,
        }
    }

    /// Facade with journaled writes: `record` returns once the entry is in
    /// memory; durability follows through a bounded in-order queue per tier.
    pub fn with_journals(
        tiers: TierSet,
        indexer: Arc<dyn SemanticIndexer>,
        archive_threshold: f64,
        journal_depth: usize,
    ) -> Self {
        let journals = Journals {
            short: WriteJournal::spawn(Arc::clone(&tiers.short), journal_depth),
            long: WriteJournal::spawn(Arc::clone(&tiers.long), journal_depth),
        };
        Self {
            tiers,
            indexer,
            archive_threshold,
            journals: Some(journals),
        }
    }

    /// Validate, store, and index one new fact. Returns the assigned id.
    ///
    /// A failed durable write keeps the in-memory entry and logs the
    /// failure (durability catches up on the next successful save); an
    /// indexer failure is logged and swallowed.
    pub async fn record(
        &self,
        content: &str,
        tier: Tier,
        draft: EntryDraft,
    ) -> Result<String, MemoryError> {
        if content.trim().is_empty() {
            return Err(MemoryError::MalformedEntry("content must not be empty".into()));
        }
        let store = self.writable_store(tier)?;

        let entry = MemoryEntry::new(content, draft);
        let id = entry.id.clone();
        let tags: BTreeSet<String> = entry
            .topic_tags
            .iter()
            .chain(entry.ambient_tags.iter())
            .cloned()
            .collect();

        match &self.journals {
            None => {
                let store = Arc::clone(store);
                let outcome = tokio::task::spawn_blocking(move || store.append(entry))
                    .await
                    .map_err(|e| MemoryError::Internal(e.to_string()))?;
                if let Err(e) = outcome {
                    warn!(id = %id, error = %e, "durable write failed; entry kept in memory");
                }
            }
            Some(journals) => {
                store.stage(entry);
                let journal = match tier {
                    Tier::Short => &journals.short,
                    _ => &journals.long,
                };
                journal.notify().await;
            }
        }
        debug!(id = %id, tier = %tier, "fact recorded");

        self.notify_indexer(content.to_string(), tier, tags);
        Ok(id)
    }

    /// Rank short- and long-term entries against the current mood and query
    /// tags. Descending score, ties broken by most recent creation first.
    ///
    /// Entries whose decayed score has already fallen to the archive
    /// threshold are filtered out even if the sweep has not caught them yet.
    pub async fn recall(
        &self,
        current_mood: &str,
        query_tags: &BTreeSet<String>,
        max_results: usize,
    ) -> Vec<RecallHit> {
        let tiers = self.tiers.clone();
        let mood = current_mood.to_string();
        let tags = query_tags.clone();
        let threshold = self.archive_threshold;

        tokio::task::spawn_blocking(move || {
            let now = Utc::now();
            let mut hits: Vec<RecallHit> = tiers
                .short
                .snapshot()
                .into_iter()
                .chain(tiers.long.snapshot())
                .filter(|entry| decayed_score(entry, now) > threshold)
                .map(|entry| RecallHit {
                    score: relevance_score(&entry, &mood, &tags, now),
                    entry,
                })
                .collect();
            hits.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.entry.created_at.cmp(&a.entry.created_at))
            });
            hits.truncate(max_results);
            hits
        })
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "recall task failed; returning no results");
            Vec::new()
        })
    }

    /// Replace an entry's content in place, wherever it lives. The archive
    /// is terminal and excluded.
    pub async fn rewrite(&self, id: &str, new_content: &str) -> Result<(), MemoryError> {
        if new_content.trim().is_empty() {
            return Err(MemoryError::MalformedEntry("content must not be empty".into()));
        }
        let tiers = self.tiers.clone();
        let id_owned = id.to_string();
        let content = new_content.to_string();
        tokio::task::spawn_blocking(move || {
            match tiers.short.replace_content(&id_owned, &content) {
                Err(MemoryError::NotFound(_)) => tiers.long.replace_content(&id_owned, &content),
                other => other,
            }
        })
        .await
        .map_err(|e| MemoryError::Internal(e.to_string()))?
    }

    /// Digest of the most recent short-term entries for prompt composition:
    /// one `[timestamp] content` line per entry, oldest first.
    pub fn recent_context(&self, max_entries: usize) -> String {
        let snapshot = self.tiers.short.snapshot();
        if snapshot.is_empty() {
            return "(no recent memories)".to_string();
        }
        snapshot
            .iter()
            .rev()
            .take(max_entries)
            .rev()
            .map(|entry| format!("[{}] {}", entry.created_at.to_rfc3339(), entry.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Entry counts per tier.
    pub fn stats(&self) -> TierStats {
        TierStats {
            short: self.tiers.short.len(),
            long: self.tiers.long.len(),
            archive_days: self.tiers.archive.day_count(),
        }
    }

    pub fn tiers(&self) -> &TierSet {
        &self.tiers
    }

    /// Flush journaled writes and release the facade.
    pub async fn shutdown(self) {
        if let Some(journals) = self.journals {
            journals.short.shutdown().await;
            journals.long.shutdown().await;
        }
    }

    fn writable_store(&self, tier: Tier) -> Result<&Arc<TierStore>, MemoryError> {
        match tier {
            Tier::Short => Ok(&self.tiers.short),
            Tier::Long => Ok(&self.tiers.long),
            Tier::Archive => Err(MemoryError::MalformedEntry(
                "archive tier is terminal; record to short or long".into(),
            )),
        }
    }

    fn notify_indexer(&self, content: String, tier: Tier, tags: BTreeSet<String>) {
        let indexer = Arc::clone(&self.indexer);
        tokio::spawn(async move {
            let outcome =
                tokio::task::spawn_blocking(move || indexer.index(&content, tier, &tags)).await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "semantic indexer call failed; continuing"),
                Err(e) => warn!(error = %e, "semantic indexer task failed; continuing"),
            }
        });
    }
}
