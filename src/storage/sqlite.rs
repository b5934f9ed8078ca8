//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{HashRecord, RunCounts, RunRecord, RunStatus};
use crate::FolioError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RECORD_COLUMNS: &str = "logical_name, url, content_hash, pdf_path, version, updated_at";

const RUN_COLUMNS: &str = "id, started_at, finished_at, seed_url, mode, config_hash, status,
     processed, created, updated, skipped, errors";

/// Raw hash record row, before validation
struct RawRecord {
    logical_name: String,
    url: String,
    content_hash: String,
    pdf_path: String,
    version: i64,
    updated_at: String,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            logical_name: row.get(0)?,
            url: row.get(1)?,
            content_hash: row.get(2)?,
            pdf_path: row.get(3)?,
            version: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    /// Checks the row can be trusted as a prior hash
    fn validate(self) -> StorageResult<HashRecord> {
        let corrupt = |reason: &str| StorageError::Corrupt {
            logical_name: self.logical_name.clone(),
            reason: reason.to_string(),
        };

        if self.content_hash.len() != 64 || !self.content_hash.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(corrupt("content hash is not a SHA-256 hex digest"));
        }
        if self.url.is_empty() {
            return Err(corrupt("missing URL"));
        }
        let version = u32::try_from(self.version)
            .ok()
            .filter(|v| *v >= 1)
            .ok_or_else(|| corrupt("version out of range"))?;

        Ok(HashRecord {
            logical_name: self.logical_name,
            url: self.url,
            content_hash: self.content_hash.to_ascii_lowercase(),
            pdf_path: self.pdf_path,
            version,
            updated_at: self.updated_at,
        })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        seed_url: row.get(3)?,
        mode: row.get(4)?,
        config_hash: row.get(5)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(6)?)
            .unwrap_or(RunStatus::Aborted),
        counts: RunCounts {
            processed: row.get::<_, i64>(7)? as u64,
            created: row.get::<_, i64>(8)? as u64,
            updated: row.get::<_, i64>(9)? as u64,
            skipped: row.get::<_, i64>(10)? as u64,
            errors: row.get::<_, i64>(11)? as u64,
        },
    })
}

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(FolioError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, FolioError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, FolioError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Writes a row directly, bypassing validation (for corruption tests)
    #[cfg(test)]
    fn insert_raw(&self, logical_name: &str, content_hash: &str, version: i64) {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO hash_records (logical_name, url, content_hash, pdf_path, version, updated_at)
                 VALUES (?1, 'https://example.com/x', ?2, 'x.pdf', ?3, '2024-01-01T00:00:00Z')",
                params![logical_name, content_hash, version],
            )
            .unwrap();
    }
}

impl Storage for SqliteStorage {
    // ===== Hash Records =====

    fn get_record(&self, logical_name: &str) -> StorageResult<Option<HashRecord>> {
        let sql = format!(
            "SELECT {} FROM hash_records WHERE logical_name = ?1",
            RECORD_COLUMNS
        );
        let raw = self
            .conn
            .query_row(&sql, params![logical_name], RawRecord::from_row)
            .optional()
            .map_err(|e| match e {
                rusqlite::Error::FromSqlConversionFailure(..)
                | rusqlite::Error::InvalidColumnType(..) => StorageError::Corrupt {
                    logical_name: logical_name.to_string(),
                    reason: e.to_string(),
                },
                other => StorageError::Sqlite(other),
            })?;

        raw.map(RawRecord::validate).transpose()
    }

    fn put_record(&mut self, record: &HashRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO hash_records (logical_name, url, content_hash, pdf_path, version, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(logical_name) DO UPDATE SET
                url = excluded.url,
                content_hash = excluded.content_hash,
                pdf_path = excluded.pdf_path,
                version = excluded.version,
                updated_at = excluded.updated_at",
            params![
                record.logical_name,
                record.url,
                record.content_hash,
                record.pdf_path,
                record.version as i64,
                record.updated_at
            ],
        )?;
        Ok(())
    }

    fn list_records(&self) -> StorageResult<Vec<HashRecord>> {
        let sql = format!(
            "SELECT {} FROM hash_records ORDER BY logical_name",
            RECORD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], RawRecord::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            match row.map_err(StorageError::from).and_then(RawRecord::validate) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Skipping unreadable hash record: {}", e),
            }
        }

        Ok(records)
    }

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM hash_records", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Run Management =====

    fn create_run(
        &mut self,
        seed_url: &str,
        mode: &str,
        config_hash: &str,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, seed_url, mode, config_hash, status) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![now, seed_url, mode, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&sql, [], run_from_row).optional()?;
        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        counts: RunCounts,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, processed = ?3, created = ?4,
             updated = ?5, skipped = ?6, errors = ?7 WHERE id = ?8",
            params![
                status.to_db_string(),
                now,
                counts.processed as i64,
                counts.created as i64,
                counts.updated as i64,
                counts.skipped as i64,
                counts.errors as i64,
                run_id
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn count_runs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
