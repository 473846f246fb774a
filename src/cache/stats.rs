//! Cache Statistics Module
//!
//! Aggregate figures computed live from the store, never persisted.

use serde::Serialize;

// == Caching Stats ==
/// Snapshot of the cache table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachingStats {
    /// Number of rows
    pub total_entries: u64,
    /// Sum of payload byte lengths
    pub total_size_bytes: u64,
    /// Rows whose expiry is already in the past
    pub expired_entries: u64,
}

impl CachingStats {
    // == Constructor ==
    pub fn new(total_entries: u64, total_size_bytes: u64, expired_entries: u64) -> Self {
        Self {
            total_entries,
            total_size_bytes,
            expired_entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_entries == 0
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = CachingStats::default();
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.total_size_bytes, 0);
        assert_eq!(stats.expired_entries, 0);
        assert!(stats.is_empty());
    }

    #[test]
    fn test_stats_not_empty() {
        let stats = CachingStats::new(5, 120, 2);
        assert!(!stats.is_empty());
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let json = serde_json::to_value(CachingStats::new(2, 10, 1)).unwrap();
        assert_eq!(json["totalEntries"], 2);
        assert_eq!(json["totalSizeBytes"], 10);
        assert_eq!(json["expiredEntries"], 1);
    }
}
