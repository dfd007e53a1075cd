#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Utc};
use keepsake::memory::archive::ArchiveStore;
use keepsake::memory::store::TierStore;
use keepsake::memory::types::{EntryDraft, MemoryEntry, Tier};
use keepsake::memory::TierSet;

/// Open a fresh tier set rooted at `dir` with the given capacities.
pub fn tier_set(dir: &Path, short_cap: usize, long_cap: usize) -> TierSet {
    TierSet {
        short: Arc::new(
            TierStore::open(Tier::Short, dir.join("short_term.json"), short_cap).unwrap(),
        ),
        long: Arc::new(TierStore::open(Tier::Long, dir.join("long_term.json"), long_cap).unwrap()),
        archive: Arc::new(ArchiveStore::open(dir.join("archive")).unwrap()),
    }
}

/// Entry with explicit importance/decay and a backdated creation time.
pub fn aged_entry(content: &str, importance: f64, decay_rate: f64, days_old: i64) -> MemoryEntry {
    let mut entry = MemoryEntry::new(
        content,
        EntryDraft {
            importance: Some(importance),
            decay_rate: Some(decay_rate),
            ..Default::default()
        },
    );
    entry.created_at = Utc::now() - Duration::days(days_old);
    entry
}

/// Entry with mood and topic tags for relevance tests.
pub fn tagged_entry(content: &str, mood: &str, topics: &[&str]) -> MemoryEntry {
    MemoryEntry::new(
        content,
        EntryDraft {
            mood_tag: Some(mood.to_string()),
            topic_tags: topics.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        },
    )
}
