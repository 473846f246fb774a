//! Remote Cache - persistent caching for expensive remote calls
//!
//! Returns a stored result while it is unexpired, otherwise runs the caller's
//! producer, persists its result in SQLite and returns it.

pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use cache::{CachingStats, Decoder, EntryInfo, JsonPrimitive, RemoteCache};
pub use config::{Config, DatabasePath};
pub use error::{CacheError, Result};
pub use models::{CallOptions, Expiry};
