//! Core memory type definitions.
//!
//! Defines [`Tier`] (the three lifecycle tiers an entry can live in),
//! [`EntryDraft`] (caller-supplied fields for a new fact), and
//! [`MemoryEntry`] (one stored conversational fact).

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::MemoryError;

/// The three memory tiers. An entry lives in exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Fresh conversational facts — small capacity, FIFO-evicted.
    Short,
    /// Facts promoted by the migration pass — larger capacity.
    Long,
    /// Terminal resting place for decayed entries; never rescored.
    Archive,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Long => "long",
            Self::Archive => "archive",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(Self::Short),
            "long" => Ok(Self::Long),
            "archive" => Ok(Self::Archive),
            _ => Err(format!("unknown tier: {s}")),
        }
    }
}

/// One stored conversational fact, matching the persisted JSON schema.
///
/// Wire field names are camelCase for compatibility with the agent's
/// existing tier files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    /// UUID v4, assigned at creation, unique across all tiers combined.
    #[serde(default = "fresh_id")]
    pub id: String,
    /// The fact text. The only field with no default — a record without it
    /// is malformed.
    pub content: String,
    /// Weight in `[0.0, 1.0]`; re-clamped after any adjustment.
    #[serde(default = "default_importance")]
    pub importance: f64,
    /// Emotional context at creation time.
    #[serde(default = "default_mood")]
    pub mood_tag: String,
    /// Coarse classification labels.
    #[serde(default)]
    pub types: BTreeSet<String>,
    /// Topic labels matched against query tags at 0.1 weight each.
    #[serde(default)]
    pub topic_tags: BTreeSet<String>,
    /// Ambient-context labels matched at 0.05 weight each.
    #[serde(default)]
    pub ambient_tags: BTreeSet<String>,
    /// Fraction of importance lost per elapsed day; non-negative.
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,
    /// Set once at creation, never mutated.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Soft associative links to other entries. Weak references only —
    /// dangling ids are ignored on lookup.
    #[serde(default)]
    pub adjacent_ids: BTreeSet<String>,
}

fn fresh_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_importance() -> f64 {
    0.5
}

fn default_mood() -> String {
    "neutral".to_string()
}

fn default_decay_rate() -> f64 {
    0.01
}

/// Caller-supplied fields for a new entry. Everything is optional;
/// unset fields take the documented defaults.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub importance: Option<f64>,
    pub mood_tag: Option<String>,
    pub types: BTreeSet<String>,
    pub topic_tags: BTreeSet<String>,
    pub ambient_tags: BTreeSet<String>,
    pub decay_rate: Option<f64>,
    pub adjacent_ids: BTreeSet<String>,
}

impl MemoryEntry {
    /// Construct a new entry. Out-of-range importance is clamped to
    /// `[0.0, 1.0]` and negative decay rates to 0.0 — construction never
    /// fails on numeric input.
    pub fn new(content: impl Into<String>, draft: EntryDraft) -> Self {
        Self {
            id: fresh_id(),
            content: content.into(),
            importance: draft
                .importance
                .unwrap_or_else(default_importance)
                .clamp(0.0, 1.0),
            mood_tag: draft.mood_tag.unwrap_or_else(default_mood),
            types: draft.types,
            topic_tags: draft.topic_tags,
            ambient_tags: draft.ambient_tags,
            decay_rate: draft.decay_rate.unwrap_or_else(default_decay_rate).max(0.0),
            created_at: Utc::now(),
            adjacent_ids: draft.adjacent_ids,
        }
    }

    /// Reconstruct an entry from a persisted JSON record.
    ///
    /// Fails with [`MemoryError::MalformedEntry`] only when `content` is
    /// absent; every other field takes its default. Numeric fields are
    /// re-clamped so a hand-edited file cannot smuggle in an invalid weight.
    pub fn from_record(value: serde_json::Value) -> Result<Self, MemoryError> {
        let mut entry: Self = serde_json::from_value(value)
            .map_err(|e| MemoryError::MalformedEntry(e.to_string()))?;
        entry.importance = entry.importance.clamp(0.0, 1.0);
        entry.decay_rate = entry.decay_rate.max(0.0);
        Ok(entry)
    }

    /// Flatten to the persisted JSON record shape.
    pub fn to_record(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("entry serialization is infallible")
    }
}
