//! Cache Store Module
//!
//! SQLite-backed key-value table: point lookup, upsert, deletes and aggregates.
//! The store is synchronous; the engine drives it from tokio's blocking pool.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::cache::{CacheEntry, CachingStats};
use crate::config::DatabasePath;
use crate::error::{CacheError, Result};

/// How long a writer waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS cache (
        key TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        expires_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_cache_expires_at ON cache(expires_at);
";

// == Cache Store ==
/// Handle on the `cache` table. Closed handles reject every operation.
#[derive(Debug)]
pub struct CacheStore {
    conn: Option<Connection>,
    /// Backing file, `None` when in memory
    path: Option<PathBuf>,
}

impl CacheStore {
    // == Constructors ==
    /// Opens the store at the configured location and ensures the schema exists.
    pub fn open(location: &DatabasePath) -> Result<Self> {
        match location.resolve() {
            Some(path) => Self::open_file(path),
            None => Self::open_in_memory(),
        }
    }

    /// Opens (creating if needed) a database file, including missing parent directories.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get(0)
        })?;
        debug!("Opened cache database {} (journal_mode={})", path.display(), mode);

        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    /// Opens an ephemeral store discarded on close.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, None)
    }

    fn with_connection(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Some(conn),
            path,
        })
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(CacheError::StoreClosed)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // == Get ==
    /// Point lookup. Expiry is the caller's concern; rows are returned as stored.
    pub fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let entry = self
            .conn()?
            .query_row(
                "SELECT key, data, created_at, expires_at FROM cache WHERE key = ?1",
                params![key],
                |row| {
                    Ok(CacheEntry {
                        key: row.get(0)?,
                        payload: row.get(1)?,
                        created_at: row.get(2)?,
                        expires_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    // == Upsert ==
    /// Writes the entry, replacing any existing row for its key.
    pub fn upsert(&self, entry: &CacheEntry) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO cache (key, data, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.key, entry.payload, entry.created_at, entry.expires_at],
        )?;
        Ok(())
    }

    // == Delete ==
    /// Removes the row for `key`. Returns whether a row existed.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn()?
            .execute("DELETE FROM cache WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// Removes the row for `key` only if it is still expired at `now_ms`.
    /// A row rewritten since it was read is left in place.
    pub fn delete_if_expired(&self, key: &str, now_ms: i64) -> Result<bool> {
        let removed = self.conn()?.execute(
            "DELETE FROM cache WHERE key = ?1 AND expires_at <= ?2",
            params![key, now_ms],
        )?;
        Ok(removed > 0)
    }

    /// Removes every row, returning how many were deleted.
    pub fn clear(&self) -> Result<usize> {
        Ok(self.conn()?.execute("DELETE FROM cache", [])?)
    }

    // == Cleanup Expired ==
    /// Removes rows with `expires_at <= now_ms`, returning how many were deleted.
    pub fn delete_expired(&self, now_ms: i64) -> Result<usize> {
        Ok(self
            .conn()?
            .execute("DELETE FROM cache WHERE expires_at <= ?1", params![now_ms])?)
    }

    // == Stats ==
    /// Aggregates row count, payload bytes and rows expired before `now_ms`.
    pub fn stats(&self, now_ms: i64) -> Result<CachingStats> {
        let (total, size, expired): (i64, i64, i64) = self.conn()?.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(LENGTH(CAST(data AS BLOB))), 0),
                    COALESCE(SUM(CASE WHEN expires_at < ?1 THEN 1 ELSE 0 END), 0)
             FROM cache",
            params![now_ms],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        Ok(CachingStats::new(
            total.max(0) as u64,
            size.max(0) as u64,
            expired.max(0) as u64,
        ))
    }

    // == Length ==
    pub fn len(&self) -> Result<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM cache", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // == Close ==
    /// Closes the connection. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => conn.close().map_err(|(_, err)| CacheError::Storage(err)),
            None => Ok(()),
        }
    }
}
