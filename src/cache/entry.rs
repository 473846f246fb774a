//! Cache Entry Module
//!
//! Defines the stored row: serialized payload plus creation/expiration timestamps.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Entry ==
/// One row of the cache table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Caller-chosen key (primary key)
    pub key: String,
    /// Serialized JSON text of the cached value
    pub payload: String,
    /// Time of last write (Unix milliseconds)
    pub created_at: i64,
    /// Time after which the row is invalid for reads (Unix milliseconds)
    pub expires_at: i64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry written now, expiring at `expires_at`.
    pub fn new(key: impl Into<String>, payload: impl Into<String>, expires_at: i64) -> Self {
        Self {
            key: key.into(),
            payload: payload.into(),
            created_at: current_timestamp_ms(),
            expires_at,
        }
    }

    // == Is Expired ==
    /// An entry is expired once `now >= expires_at`.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    // == Time To Live ==
    /// Remaining lifetime at `now_ms` in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms_at(&self, now_ms: i64) -> u64 {
        self.expires_at.saturating_sub(now_ms).max(0) as u64
    }

    /// Payload size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.payload.len()
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.created_at)
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires_at)
    }
}

// == Entry Info ==
/// Row metadata exposed without decoding the payload.
///
/// Timestamps appear both as Unix milliseconds and as RFC 3339 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInfo {
    pub key: String,
    pub created_at: i64,
    pub expires_at: i64,
    pub created_at_utc: Option<DateTime<Utc>>,
    pub expires_at_utc: Option<DateTime<Utc>>,
    pub ttl_remaining_ms: u64,
    pub size_bytes: u64,
    pub expired: bool,
}

impl EntryInfo {
    /// Describes `entry` as seen at `now_ms`.
    pub fn at(entry: &CacheEntry, now_ms: i64) -> Self {
        Self {
            key: entry.key.clone(),
            created_at: entry.created_at,
            expires_at: entry.expires_at,
            created_at_utc: entry.created_at_utc(),
            expires_at_utc: entry.expires_at_utc(),
            ttl_remaining_ms: entry.ttl_remaining_ms_at(now_ms),
            size_bytes: entry.size_bytes() as u64,
            expired: entry.is_expired_at(now_ms),
        }
    }
}

impl From<&CacheEntry> for EntryInfo {
    fn from(entry: &CacheEntry) -> Self {
        Self::at(entry, current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
