//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Engine used before `init` (or after `dispose`)
    #[error("Remote cache is not initialized, call init() first")]
    Uninitialized,

    /// Caller contract violation, detected before any I/O
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Value could not be encoded for storage
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Stored payload could not be decoded into the requested type
    #[error("Deserialization failed: {0}")]
    Deserialization(String),

    /// Store handle was closed by `dispose`
    #[error("Cache store is closed")]
    StoreClosed,

    /// Underlying SQLite failure
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    /// Filesystem failure while preparing the database location
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Internal error (poisoned lock, failed blocking task)
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
