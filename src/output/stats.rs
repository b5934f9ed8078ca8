//! Statistics generation from the hash database
//!
//! This module provides functionality for extracting and displaying
//! archive statistics from the storage layer.

use crate::storage::{RunRecord, Storage};
use crate::FolioError;

/// Archive statistics summary
#[derive(Debug, Clone)]
pub struct ArchiveStatistics {
    /// Number of logical pages with a stored hash
    pub total_records: u64,

    /// Records that have more than one version
    pub versioned_records: u64,

    /// Highest version number of any record
    pub max_version: u32,

    /// Number of recorded runs
    pub total_runs: u64,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(ArchiveStatistics)` - Successfully loaded statistics
/// * `Err(FolioError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<ArchiveStatistics, FolioError> {
    let total_records = storage.count_records()?;
    let records = storage.list_records()?;
    let versioned_records = records.iter().filter(|r| r.version > 1).count() as u64;
    let max_version = records.iter().map(|r| r.version).max().unwrap_or(0);

    let total_runs = storage.count_runs()?;
    let latest_run = storage.get_latest_run()?;

    Ok(ArchiveStatistics {
        total_records,
        versioned_records,
        max_version,
        total_runs,
        latest_run,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ArchiveStatistics) {
    println!("=== Archive Statistics ===\n");

    println!("Pages:");
    println!("  Archived pages: {}", stats.total_records);
    println!("  Pages with several versions: {}", stats.versioned_records);
    println!("  Highest version: {}", stats.max_version);
    println!();

    println!("Runs: {}", stats.total_runs);

    if let Some(run) = &stats.latest_run {
        println!();
        println!("Latest run (#{}):", run.id);
        println!("  Seed: {}", run.seed_url);
        println!("  Mode: {}", run.mode);
        println!("  Status: {}", run.status.to_db_string());
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!(
            "  Processed: {} (created {}, updated {}, skipped {}, errors {})",
            run.counts.processed,
            run.counts.created,
            run.counts.updated,
            run.counts.skipped,
            run.counts.errors
        );
    }
}
