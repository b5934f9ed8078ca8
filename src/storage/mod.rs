//! Storage module for persisting content hashes across runs
//!
//! This module handles all database operations for the exporter, including:
//! - SQLite database initialization and schema management
//! - Hash record lookup and upsert, keyed by logical page name
//! - Run tracking (start/finish, mode, final counts)

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::FolioError;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(FolioError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, FolioError> {
    SqliteStorage::new(path)
}

/// A persisted content hash for one logical page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRecord {
    /// Logical page name (collision-resolved, without version suffix)
    pub logical_name: String,

    /// Normalized URL that owns this logical name
    pub url: String,

    /// Hex-encoded SHA-256 of the latest written PDF
    pub content_hash: String,

    /// Path of the latest written PDF
    pub pdf_path: String,

    /// Version number of the latest PDF (1 for the first write)
    pub version: u32,

    /// RFC 3339 timestamp of the last write
    pub updated_at: String,
}

/// Final counts persisted with a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub processed: u64,
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub seed_url: String,
    pub mode: String,
    pub config_hash: String,
    pub status: RunStatus,
    pub counts: RunCounts,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Aborted,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "aborted" => Some(Self::Aborted),
            _ => None,
        }
    }
}
