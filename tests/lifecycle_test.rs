//! End-to-end lifecycle: record → sweep → migrate → recall.

mod helpers;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use helpers::{aged_entry, tier_set};
use keepsake::memory::maintenance::{
    run_migration, run_sweep, MaintenanceScheduler, SchedulerSettings,
};
use keepsake::memory::recall::{NullIndexer, RetrievalFacade};
use keepsake::memory::types::{EntryDraft, Tier};

#[test]
fn decayed_entry_moves_to_archive_and_fresh_entry_survives() {
    let dir = tempfile::tempdir().unwrap();
    let tiers = tier_set(dir.path(), 100, 500);

    // decayedScore = 0.9 - 0.05 * 20 = -0.1 → below the 0.1 threshold
    let doomed = aged_entry("twenty days stale", 0.9, 0.05, 20);
    let doomed_id = doomed.id.clone();
    let keeper = aged_entry("still relevant", 0.9, 0.01, 2);
    let keeper_id = keeper.id.clone();
    tiers.short.append(doomed).unwrap();
    tiers.long.append(keeper.clone()).unwrap();

    let report = run_sweep(&tiers, 0.1, Utc::now());
    assert_eq!(report.archived, 1);

    // Archived entry: present in archive, absent from source.
    let archived = tiers.archive.read_day(Utc::now().date_naive()).unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].id, doomed_id);
    assert!(tiers.short.is_empty());

    // Above-threshold entry: unchanged.
    let long = tiers.long.snapshot();
    assert_eq!(long.len(), 1);
    assert_eq!(long[0].id, keeper_id);
    assert_eq!(long[0].importance, keeper.importance);
}

#[test]
fn migration_is_a_full_promotion() {
    let dir = tempfile::tempdir().unwrap();
    let tiers = tier_set(dir.path(), 100, 500);

    for i in 0..10 {
        tiers.short.append(aged_entry(&format!("turn {i}"), 0.7, 0.0, 0)).unwrap();
    }
    let report = run_migration(&tiers).unwrap();
    assert_eq!(report.migrated, 10);
    assert!(tiers.short.is_empty());
    assert_eq!(tiers.long.len(), 10);

    // Migration must not mint new ids or reorder.
    let long = tiers.long.snapshot();
    assert_eq!(long[0].content, "turn 0");
    assert_eq!(long[9].content, "turn 9");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn archived_entries_disappear_from_recall() {
    let dir = tempfile::tempdir().unwrap();
    let tiers = tier_set(dir.path(), 100, 500);
    let facade = RetrievalFacade::new(tiers.clone(), Arc::new(NullIndexer), 0.1);

    facade
        .record("a fact worth keeping", Tier::Short, EntryDraft::default())
        .await
        .unwrap();
    tiers.short.append(aged_entry("long forgotten", 0.5, 0.1, 30)).unwrap();

    run_sweep(&tiers, 0.1, Utc::now());

    let hits = facade.recall("neutral", &BTreeSet::new(), 10).await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entry.content, "a fact worth keeping");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scheduler_survives_ticks_and_stops_promptly() {
    let dir = tempfile::tempdir().unwrap();
    let tiers = tier_set(dir.path(), 100, 500);
    tiers.short.append(aged_entry("sweep fodder", 0.2, 0.05, 10)).unwrap();

    let scheduler = MaintenanceScheduler::spawn(
        tiers.clone(),
        SchedulerSettings {
            heartbeat: Duration::from_millis(40),
            migration_every: Duration::from_millis(120),
            archive_threshold: 0.1,
        },
    );

    // Let several heartbeats and at least one migration pass run.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let stopped = tokio::time::timeout(Duration::from_secs(5), scheduler.stop()).await;
    assert!(stopped.is_ok(), "stop must not wait out any interval");

    // 0.2 - 0.05*10 = -0.3 → archived by some heartbeat.
    assert!(tiers.short.is_empty());
    let archived = tiers.archive.read_day(Utc::now().date_naive()).unwrap();
    assert_eq!(archived.len(), 1);
}
