//! Statistics generation from the snapshot database
//!
//! This module provides functionality for extracting and displaying
//! snapshot and run statistics from the storage layer.

use crate::config::Locale;
use crate::storage::{RunRecord, RunStatus, Storage};
use crate::CellarError;
use chrono::NaiveDate;

/// Number of runs listed by `--stats`
pub const RECENT_RUNS: u32 = 10;

/// Snapshot statistics summary
#[derive(Debug, Clone)]
pub struct SnapshotStatistics {
    /// The snapshot date the counts refer to
    pub snapshot_date: NaiveDate,

    /// Items stored per locale for that date
    pub items_by_locale: Vec<(Locale, u64)>,

    /// Every date with stored items, newest first
    pub snapshot_dates: Vec<NaiveDate>,

    /// Most recent crawl runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

impl SnapshotStatistics {
    pub fn total_items(&self) -> u64 {
        self.items_by_locale.iter().map(|(_, count)| count).sum()
    }

    pub fn failed_runs(&self) -> usize {
        self.recent_runs
            .iter()
            .filter(|run| run.status == RunStatus::Failed)
            .count()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
/// * `snapshot_date` - The date to count items for
///
/// # Returns
///
/// * `Ok(SnapshotStatistics)` - Successfully loaded statistics
/// * `Err(CellarError)` - Failed to query statistics
pub fn load_statistics(
    storage: &dyn Storage,
    snapshot_date: NaiveDate,
) -> Result<SnapshotStatistics, CellarError> {
    let mut items_by_locale = Vec::with_capacity(Locale::ALL.len());
    for locale in Locale::ALL {
        items_by_locale.push((locale, storage.count_items(locale, snapshot_date)?));
    }

    Ok(SnapshotStatistics {
        snapshot_date,
        items_by_locale,
        snapshot_dates: storage.snapshot_dates()?,
        recent_runs: storage.recent_runs(RECENT_RUNS)?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &SnapshotStatistics) {
    println!("=== Snapshot Statistics ({}) ===\n", stats.snapshot_date);

    println!("Items by Locale:");
    for (locale, count) in &stats.items_by_locale {
        println!("  {}: {}", locale, count);
    }
    println!("  Total: {}", stats.total_items());
    println!();

    if !stats.snapshot_dates.is_empty() {
        println!("Snapshot Dates ({}):", stats.snapshot_dates.len());
        for date in &stats.snapshot_dates {
            println!("  - {}", date);
        }
        println!();
    }

    if stats.recent_runs.is_empty() {
        println!("No crawl runs recorded");
        return;
    }

    println!("Recent Runs:");
    for run in &stats.recent_runs {
        println!(
            "  #{} [{}] {} {} {}: {} items (started {})",
            run.id,
            run.status.to_db_string(),
            run.snapshot_date,
            run.locale,
            run.category,
            run.items_stored,
            run.started_at
        );
    }

    let failed = stats.failed_runs();
    if failed > 0 {
        println!();
        println!("{} of the last {} runs failed", failed, stats.recent_runs.len());
    }
}
