//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{HashRecord, RunCounts, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt hash record '{logical_name}': {reason}")]
    Corrupt {
        logical_name: String,
        reason: String,
    },

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The exporter only needs get/put semantics on hash records; location and
/// format belong to the implementation. Implementations must be `Send` so a
/// backend can sit behind a mutex shared by worker tasks.
pub trait Storage: Send {
    // ===== Hash Records =====

    /// Gets the hash record for a logical name
    ///
    /// Returns `StorageError::Corrupt` when the row exists but cannot be
    /// trusted; callers treat that as "no prior hash".
    fn get_record(&self, logical_name: &str) -> StorageResult<Option<HashRecord>>;

    /// Inserts or replaces the hash record for `record.logical_name`
    fn put_record(&mut self, record: &HashRecord) -> StorageResult<()>;

    /// Lists every readable hash record (corrupt rows are skipped)
    fn list_records(&self) -> StorageResult<Vec<HashRecord>>;

    /// Counts stored hash records
    fn count_records(&self) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `seed_url` - The normalized seed URL
    /// * `mode` - The effective export mode
    /// * `config_hash` - Hash of the configuration file (empty if none)
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, seed_url: &str, mode: &str, config_hash: &str)
        -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as finished with its final status and counts
    fn finish_run(&mut self, run_id: i64, status: RunStatus, counts: RunCounts)
        -> StorageResult<()>;

    /// Counts recorded runs
    fn count_runs(&self) -> StorageResult<u64>;
}
