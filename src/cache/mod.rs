//! Cache Module
//!
//! Persistent, expiration-aware caching of remote call results on top of SQLite.

pub mod codec;
mod engine;
mod entry;
mod stats;
mod store;


// Re-export public types
pub use codec::{BoxError, Decoder, JsonPrimitive};
pub use engine::RemoteCache;
pub use entry::{current_timestamp_ms, CacheEntry, EntryInfo};
pub use stats::CachingStats;
pub use store::CacheStore;
