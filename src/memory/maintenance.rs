//! Background maintenance — decay sweep, archival, and tier migration.
//!
//! [`MaintenanceScheduler`] drives a fixed-interval heartbeat: every tick it
//! rescans the short- and long-term tiers, moving entries whose decayed
//! score has fallen to the archive threshold into the terminal archive. On
//! a separate, coarser interval it migrates all short-term entries into
//! long-term (time-based promotion). Scores are always recomputed on
//! demand; nothing is mutated in place by the sweep.
//!
//! One bad entry never halts a pass: per-entry failures are logged and that
//! entry is skipped for the tick. Only an explicit [`stop`] ends the loop,
//! and stop wakes the sleep promptly instead of waiting out the interval.
//!
//! [`stop`]: MaintenanceScheduler::stop

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::archive::ArchiveStore;
use super::scoring::decayed_score;
use super::store::TierStore;
use super::types::MemoryEntry;

/// Scheduler lifecycle states, observable through [`MaintenanceScheduler::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Scanning,
    Archiving,
    Migrating,
}

/// Outcome of one archive sweep across the scored tiers.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Entries examined across short- and long-term.
    pub scanned: usize,
    /// Entries moved into the archive.
    pub archived: usize,
    /// Entries that failed mid-move and were left in their source tier.
    pub skipped: usize,
}

/// Outcome of one short→long migration pass.
#[derive(Debug)]
pub struct MigrationReport {
    pub migrated: usize,
}

/// The stores the scheduler and facade share. Cloning clones the `Arc`s.
#[derive(Clone)]
pub struct TierSet {
    pub short: Arc<TierStore>,
    pub long: Arc<TierStore>,
    pub archive: Arc<ArchiveStore>,
}

impl TierSet {
    /// Open all three tiers under the configured data directory, creating
    /// it if needed.
    pub fn open(config: &crate::config::KeepsakeConfig) -> Result<Self, super::error::MemoryError> {
        let dir = config.resolved_data_dir();
        std::fs::create_dir_all(&dir).map_err(|e| super::error::MemoryError::Persistence {
            path: dir.display().to_string(),
            source: e,
        })?;
        Ok(Self {
            short: Arc::new(TierStore::open(
                super::types::Tier::Short,
                dir.join("short_term.json"),
                config.capacity.short_term,
            )?),
            long: Arc::new(TierStore::open(
                super::types::Tier::Long,
                dir.join("long_term.json"),
                config.capacity.long_term,
            )?),
            archive: Arc::new(ArchiveStore::open(dir.join("archive"))?),
        })
    }
}

/// Score both mutable tiers and archive everything at or below `threshold`.
///
/// Usable one-shot (CLI `sweep`) or from the scheduler heartbeat.
pub fn run_sweep(tiers: &TierSet, threshold: f64, now: DateTime<Utc>) -> SweepReport {
    sweep_with(tiers, threshold, now, |_| {})
}

/// Single-scan sweep. `on_pending` fires once, between the scan and the
/// archival phase, with the number of expired entries found — the scheduler
/// hangs its state transition off it without rescanning.
pub(crate) fn sweep_with(
    tiers: &TierSet,
    threshold: f64,
    now: DateTime<Utc>,
    on_pending: impl FnOnce(usize),
) -> SweepReport {
    let mut report = SweepReport::default();
    let batches: Vec<(&Arc<TierStore>, Vec<MemoryEntry>)> = [&tiers.short, &tiers.long]
        .into_iter()
        .map(|store| {
            let expired = collect_expired(store, threshold, now, &mut report.scanned);
            (store, expired)
        })
        .collect();
    on_pending(batches.iter().map(|(_, expired)| expired.len()).sum());
    for (store, expired) in batches {
        archive_batch(store, &tiers.archive, expired, &mut report);
    }
    if report.archived > 0 || report.skipped > 0 {
        info!(
            scanned = report.scanned,
            archived = report.archived,
            skipped = report.skipped,
            "archive sweep finished"
        );
    }
    report
}

fn archive_batch(
    store: &TierStore,
    archive: &ArchiveStore,
    expired: Vec<MemoryEntry>,
    report: &mut SweepReport,
) {
    for entry in expired {
        // Archive before removing: a crash between the two leaves a
        // duplicate in the archive, never a lost entry.
        if let Err(e) = archive.append(&entry) {
            warn!(id = %entry.id, tier = %store.tier(), error = %e,
                "archival failed; entry stays in its source tier");
            report.skipped += 1;
            continue;
        }
        match store.remove_by_id(&entry.id) {
            Ok(_) => {
                report.archived += 1;
                debug!(id = %entry.id, tier = %store.tier(), "entry archived");
            }
            // Removed concurrently between snapshot and now; the archive
            // copy is harmless surplus.
            Err(e) => {
                warn!(id = %entry.id, error = %e, "entry vanished mid-sweep");
                report.skipped += 1;
            }
        }
    }
}

fn collect_expired(
    store: &TierStore,
    threshold: f64,
    now: DateTime<Utc>,
    scanned: &mut usize,
) -> Vec<MemoryEntry> {
    store
        .snapshot()
        .into_iter()
        .inspect(|_| *scanned += 1)
        .filter(|entry| decayed_score(entry, now) <= threshold)
        .collect()
}

/// Move **all** short-term entries into long-term and clear short-term.
/// Coarse, time-based promotion; long-term overflow FIFO-evicts as usual.
///
/// A failed save on either side keeps the in-memory promotion — the batch
/// always lands in long-term before the error surfaces.
pub fn run_migration(tiers: &TierSet) -> Result<MigrationReport, super::error::MemoryError> {
    let batch = tiers.short.drain_all();
    let migrated = batch.len();
    if migrated > 0 {
        tiers.long.extend(batch)?;
        info!(migrated, "short-term entries promoted to long-term");
    }
    Ok(MigrationReport { migrated })
}

/// Knobs for the background loop.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub heartbeat: Duration,
    pub migration_every: Duration,
    pub archive_threshold: f64,
}

pub struct MaintenanceScheduler {
    shutdown: watch::Sender<bool>,
    state: watch::Receiver<SchedulerState>,
    handle: JoinHandle<()>,
}

impl MaintenanceScheduler {
    /// Start the background task. The first sweep fires one heartbeat after
    /// startup, not immediately.
    pub fn spawn(tiers: TierSet, settings: SchedulerSettings) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let (state_tx, state) = watch::channel(SchedulerState::Idle);

        let handle = tokio::spawn(async move {
            let start = tokio::time::Instant::now();
            let mut heartbeat =
                tokio::time::interval_at(start + settings.heartbeat, settings.heartbeat);
            let mut migration = tokio::time::interval_at(
                start + settings.migration_every,
                settings.migration_every,
            );
            heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            migration.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            info!(
                heartbeat_secs = settings.heartbeat.as_secs(),
                migration_secs = settings.migration_every.as_secs(),
                "maintenance scheduler running"
            );

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = heartbeat.tick() => {
                        let tiers = tiers.clone();
                        let state_tx = state_tx.clone();
                        let threshold = settings.archive_threshold;
                        let result = tokio::task::spawn_blocking(move || {
                            let _ = state_tx.send(SchedulerState::Scanning);
                            let report = sweep_with(&tiers, threshold, Utc::now(), |pending| {
                                if pending > 0 {
                                    let _ = state_tx.send(SchedulerState::Archiving);
                                }
                            });
                            let _ = state_tx.send(SchedulerState::Idle);
                            report
                        })
                        .await;
                        if let Err(e) = result {
                            warn!(error = %e, "sweep task failed; continuing");
                        }
                    }
                    _ = migration.tick() => {
                        let tiers = tiers.clone();
                        let state_tx = state_tx.clone();
                        let result = tokio::task::spawn_blocking(move || {
                            let _ = state_tx.send(SchedulerState::Migrating);
                            let outcome = run_migration(&tiers);
                            let _ = state_tx.send(SchedulerState::Idle);
                            outcome
                        })
                        .await;
                        match result {
                            Ok(Err(e)) => warn!(error = %e, "migration pass failed; continuing"),
                            Err(e) => warn!(error = %e, "migration task failed; continuing"),
                            Ok(Ok(_)) => {}
                        }
                    }
                }
            }
            info!("maintenance scheduler stopped");
        });

        Self {
            shutdown,
            state,
            handle,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Signal shutdown, wake any in-progress sleep immediately, and join the
    /// task before returning. No pass is left half-applied.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "scheduler task panicked during shutdown");
        }
    }
}
