//! One-shot CLI commands over the memory engine.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;

use keepsake::config::KeepsakeConfig;
use keepsake::memory::maintenance;
use keepsake::memory::recall::{NullIndexer, RetrievalFacade};
use keepsake::memory::types::{EntryDraft, Tier};
use keepsake::memory::TierSet;

fn open_facade(config: &KeepsakeConfig) -> Result<RetrievalFacade> {
    let tiers = TierSet::open(config)?;
    Ok(RetrievalFacade::new(
        tiers,
        Arc::new(NullIndexer),
        config.maintenance.archive_threshold,
    ))
}

fn tag_set(raw: &[String]) -> BTreeSet<String> {
    raw.iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

/// Store one fact from the command line.
#[allow(clippy::too_many_arguments)]
pub async fn record(
    config: &KeepsakeConfig,
    content: &str,
    tier: Tier,
    importance: Option<f64>,
    mood: Option<String>,
    topic_tags: &[String],
    ambient_tags: &[String],
    decay_rate: Option<f64>,
) -> Result<()> {
    let facade = open_facade(config)?;
    let draft = EntryDraft {
        importance,
        mood_tag: mood,
        topic_tags: tag_set(topic_tags),
        ambient_tags: tag_set(ambient_tags),
        decay_rate,
        ..Default::default()
    };
    let id = facade.record(content, tier, draft).await?;
    println!("Recorded {id} into the {tier} tier.");
    Ok(())
}

/// Rank and print the most relevant entries for a mood and tag set.
pub async fn recall(
    config: &KeepsakeConfig,
    mood: &str,
    query_tags: &[String],
    max_results: Option<usize>,
) -> Result<()> {
    let facade = open_facade(config)?;
    let max = max_results.unwrap_or(config.retrieval.default_max_results);
    let hits = facade.recall(mood, &tag_set(query_tags), max).await;

    if hits.is_empty() {
        println!("No memories matched.");
        return Ok(());
    }
    println!("{:<38} {:<8} {:<12} Content", "ID", "Score", "Mood");
    println!("{}", "-".repeat(90));
    for hit in &hits {
        println!(
            "{:<38} {:<8.3} {:<12} {}",
            hit.entry.id, hit.score, hit.entry.mood_tag, hit.entry.content
        );
    }
    Ok(())
}

/// Replace an entry's content in place.
pub async fn rewrite(config: &KeepsakeConfig, id: &str, new_content: &str) -> Result<()> {
    let facade = open_facade(config)?;
    facade.rewrite(id, new_content).await?;
    println!("Rewrote {id}.");
    Ok(())
}

/// One-shot archive sweep across the scored tiers.
pub fn sweep(config: &KeepsakeConfig) -> Result<()> {
    let tiers = TierSet::open(config)?;
    let report = maintenance::run_sweep(&tiers, config.maintenance.archive_threshold, Utc::now());

    println!("Scanned {} entries.", report.scanned);
    if report.archived > 0 {
        println!("Archived {} decayed entries.", report.archived);
    } else {
        println!("Nothing below the archive threshold.");
    }
    if report.skipped > 0 {
        println!("Skipped {} entries due to errors (left in place).", report.skipped);
    }
    Ok(())
}

/// One-shot short→long migration pass.
pub fn migrate(config: &KeepsakeConfig) -> Result<()> {
    let tiers = TierSet::open(config)?;
    let report = maintenance::run_migration(&tiers)?;
    if report.migrated > 0 {
        println!("Promoted {} short-term entries to long-term.", report.migrated);
    } else {
        println!("Short-term tier is empty; nothing to migrate.");
    }
    Ok(())
}

/// Display per-tier statistics in the terminal.
pub fn stats(config: &KeepsakeConfig) -> Result<()> {
    let facade = open_facade(config)?;
    let stats = facade.stats();

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Short-term entries:  {}", stats.short);
    println!("  Long-term entries:   {}", stats.long);
    println!("  Archive day files:   {}", stats.archive_days);
    println!("  Data directory:      {}", config.resolved_data_dir().display());
    Ok(())
}
