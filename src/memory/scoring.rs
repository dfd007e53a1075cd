//! Pure scoring functions — decay-adjusted importance and query relevance.
//!
//! No shared state; safe to call from any thread. Absolute scores carry no
//! meaning across queries (no normalization is applied) — they only rank
//! candidates within a single call.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use super::types::MemoryEntry;

/// Whole elapsed days between an entry's creation and `now`, floored at 0.
/// Sub-day age counts as zero, so a fact decays nothing on the day it is
/// recorded.
pub fn age_days(entry: &MemoryEntry, now: DateTime<Utc>) -> f64 {
    (now - entry.created_at).num_days().max(0) as f64
}

/// Importance after time decay. No floor — the result may be negative, and
/// callers compare it against the archive threshold directly.
pub fn decayed_score(entry: &MemoryEntry, now: DateTime<Utc>) -> f64 {
    entry.importance - entry.decay_rate * age_days(entry, now)
}

/// Query-relevance score: additive weighted sum of importance, mood match,
/// tag overlap, minus the decay penalty. O(log n) set lookups per query tag,
/// O(1) everything else.
pub fn relevance_score(
    entry: &MemoryEntry,
    current_mood: &str,
    query_tags: &BTreeSet<String>,
    now: DateTime<Utc>,
) -> f64 {
    let importance_weight = entry.importance * 0.5;

    let mood_match = if entry.mood_tag == current_mood { 1.0 } else { 0.5 };
    let mood_weight = mood_match * 0.3;

    let topic_overlap = entry.topic_tags.intersection(query_tags).count() as f64 * 0.1;
    let ambient_overlap = entry.ambient_tags.intersection(query_tags).count() as f64 * 0.05;

    let decay_penalty = entry.decay_rate * age_days(entry, now);

    importance_weight + mood_weight + topic_overlap + ambient_overlap - decay_penalty
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::types::EntryDraft;
    use chrono::Duration;

    fn entry(importance: f64, decay_rate: f64) -> MemoryEntry {
        MemoryEntry::new(
            "scored fact",
            EntryDraft {
                importance: Some(importance),
                decay_rate: Some(decay_rate),
                ..Default::default()
            },
        )
    }

    fn tags(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn zero_elapsed_time_means_no_decay() {
        let e = entry(0.7, 0.05);
        assert_eq!(decayed_score(&e, e.created_at), 0.7);
    }

    #[test]
    fn decayed_score_can_go_negative() {
        // importance 0.9, decay 0.05/day, 20 days old => 0.9 - 1.0 = -0.1
        let mut e = entry(0.9, 0.05);
        e.created_at = Utc::now() - Duration::days(20);
        let score = decayed_score(&e, Utc::now());
        assert!((score - (-0.1)).abs() < 1e-9);
    }

    #[test]
    fn clock_skew_never_yields_negative_age() {
        let mut e = entry(0.5, 0.1);
        e.created_at = Utc::now() + Duration::days(3);
        assert_eq!(age_days(&e, Utc::now()), 0.0);
        assert_eq!(decayed_score(&e, Utc::now()), 0.5);
    }

    #[test]
    fn sub_day_age_truncates_to_zero() {
        let mut e = entry(0.5, 0.5);
        e.created_at = Utc::now() - Duration::hours(23);
        assert_eq!(decayed_score(&e, Utc::now()), 0.5);
    }

    #[test]
    fn relevance_rewards_exact_mood_match() {
        let mut e = entry(0.6, 0.0);
        e.mood_tag = "melancholy".into();

        let now = Utc::now();
        let empty = BTreeSet::new();
        let matched = relevance_score(&e, "melancholy", &empty, now);
        let unmatched = relevance_score(&e, "cheerful", &empty, now);

        // importance 0.3 + mood 0.3 vs importance 0.3 + mood 0.15
        assert!((matched - 0.6).abs() < 1e-9);
        assert!((unmatched - 0.45).abs() < 1e-9);
    }

    #[test]
    fn relevance_counts_tag_overlap_per_kind() {
        let mut e = entry(0.0, 0.0);
        e.mood_tag = "x".into();
        e.topic_tags = tags(&["garden", "weather"]);
        e.ambient_tags = tags(&["rain", "evening"]);

        let query = tags(&["garden", "rain", "unrelated"]);
        let score = relevance_score(&e, "y", &query, Utc::now());

        // mood 0.15 + one topic hit 0.1 + one ambient hit 0.05
        assert!((score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn relevance_subtracts_decay_penalty() {
        let mut e = entry(1.0, 0.02);
        e.created_at = Utc::now() - Duration::days(10);

        let empty = BTreeSet::new();
        let score = relevance_score(&e, "other", &empty, Utc::now());
        // importance 0.5 + mood 0.15 - penalty 0.2
        assert!((score - 0.45).abs() < 1e-9);
    }
}
