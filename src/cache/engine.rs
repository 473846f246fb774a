//! Cache Engine
//!
//! Orchestrates lookup, expiry checks, producer invocation and storage, and
//! owns the store's open/close lifecycle.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task;
use tracing::{debug, info, warn};

use crate::cache::{codec, current_timestamp_ms, CacheEntry, CacheStore, CachingStats, EntryInfo};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{CallOptions, Expiry};

/// State that exists only between `init` and `dispose`.
#[derive(Debug)]
struct EngineState {
    store: Arc<Mutex<CacheStore>>,
    default_cache_duration: Duration,
    verbose: bool,
}

// == Remote Cache ==
/// Persistent cache in front of expensive remote calls.
///
/// Construct once and share by reference (or `Arc`). Every operation other
/// than `init`/`dispose` fails with [`CacheError::Uninitialized`] until
/// `init` has run.
///
/// Concurrent calls for the same key are not coalesced: both may invoke their
/// producer and the later write wins.
#[derive(Debug, Default)]
pub struct RemoteCache {
    state: RwLock<Option<Arc<EngineState>>>,
}

impl RemoteCache {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Init ==
    /// Opens the store and applies the configuration. With `sweep_on_init`
    /// set, rows that expired while the process was not running are deleted.
    ///
    /// Calling `init` again while initialized is a no-op; the first
    /// configuration stays in effect.
    pub async fn init(&self, config: &Config) -> Result<()> {
        let mut state = self.state.write().await;
        if state.is_some() {
            debug!("Remote cache already initialized, ignoring init");
            return Ok(());
        }

        let location = config.database_path.clone();
        let sweep = config.sweep_on_init;
        let (store, swept) = task::spawn_blocking(move || -> Result<(CacheStore, usize)> {
            let store = CacheStore::open(&location)?;
            let swept = if sweep {
                store.delete_expired(current_timestamp_ms())?
            } else {
                0
            };
            Ok((store, swept))
        })
        .await
        .map_err(map_join_error)??;

        if config.verbose_mode {
            info!(
                "Remote cache initialized: default_duration={:?}, path={:?}, swept {} expired entries",
                config.default_cache_duration,
                store.path(),
                swept
            );
        }

        *state = Some(Arc::new(EngineState {
            store: Arc::new(Mutex::new(store)),
            default_cache_duration: config.default_cache_duration,
            verbose: config.verbose_mode,
        }));
        Ok(())
    }

    // == Dispose ==
    /// Closes the store and returns to the uninitialized state.
    /// Disposing an uninitialized engine is a no-op.
    pub async fn dispose(&self) -> Result<()> {
        let taken = self.state.write().await.take();
        if let Some(state) = taken {
            run_blocking(&state.store, |store| store.close()).await?;
            if state.verbose {
                info!("Remote cache disposed");
            }
        }
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Default expiration applied to calls without an explicit one.
    pub async fn default_cache_duration(&self) -> Result<Duration> {
        Ok(self.session().await?.default_cache_duration)
    }

    async fn session(&self) -> Result<Arc<EngineState>> {
        self.state
            .read()
            .await
            .clone()
            .ok_or(CacheError::Uninitialized)
    }

    // == Call ==
    /// Returns the cached value for `key`, or runs `remote`, stores its
    /// result and returns it.
    ///
    /// Errors from `remote` are returned unchanged and nothing is stored.
    /// Engine errors are converted into `E`, so `anyhow::Error` or any error
    /// type implementing `From<CacheError>` works.
    ///
    /// A payload that fails to decode counts as a miss. A value that fails to
    /// encode, or whose write fails, is still returned to the caller.
    pub async fn call<T, E, F, Fut>(
        &self,
        key: &str,
        remote: F,
        options: CallOptions<T>,
    ) -> std::result::Result<T, E>
    where
        T: Serialize,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let state = self.session().await?;
        let (decoder, expiry) = options.validate(key)?;

        if options.force_refresh {
            if state.verbose {
                debug!("Force refresh for key '{}'", key);
            }
        } else {
            let lookup = key.to_string();
            let cached = run_blocking(&state.store, move |store| store.get(&lookup)).await?;

            let now = current_timestamp_ms();
            match cached {
                Some(entry) if entry.is_expired_at(now) => {
                    if state.verbose {
                        debug!("Cache expired for key '{}'", key);
                    }
                    let expired = key.to_string();
                    run_blocking(&state.store, move |store| {
                        store.delete_if_expired(&expired, now)
                    })
                    .await?;
                }
                Some(entry) => match decoder.decode(&entry.payload) {
                    Ok(value) => {
                        if state.verbose {
                            debug!("Cache hit for key '{}'", key);
                        }
                        return Ok(value);
                    }
                    Err(err) => {
                        warn!("Ignoring cached value for key '{}': {}", key, err);
                    }
                },
                None => {
                    if state.verbose {
                        debug!("Cache miss for key '{}'", key);
                    }
                }
            }
        }

        let value = remote().await?;

        match codec::encode(&value) {
            Ok(payload) => {
                let now = current_timestamp_ms();
                let expires_at = expiry
                    .unwrap_or(Expiry::After(state.default_cache_duration))
                    .resolve(now);
                let entry = CacheEntry {
                    key: key.to_string(),
                    payload,
                    created_at: now,
                    expires_at,
                };

                match run_blocking(&state.store, move |store| store.upsert(&entry)).await {
                    Ok(()) => {
                        if state.verbose {
                            debug!("Cached key '{}' until {}", key, expires_at);
                        }
                    }
                    Err(err) => warn!("Failed to store key '{}': {}", key, err),
                }
            }
            Err(err) => warn!("Not caching key '{}': {}", key, err),
        }

        Ok(value)
    }

    // == Management ==
    /// Deletes the entry for `key`. Returns whether one existed.
    pub async fn clear_cache_for_key(&self, key: &str) -> Result<bool> {
        let state = self.session().await?;
        let target = key.to_string();
        let removed = run_blocking(&state.store, move |store| store.delete(&target)).await?;
        if state.verbose {
            info!("Cleared cache for key '{}' (existed={})", key, removed);
        }
        Ok(removed)
    }

    /// Deletes every entry, returning how many were removed.
    pub async fn clear_cache(&self) -> Result<usize> {
        let state = self.session().await?;
        let removed = run_blocking(&state.store, |store| store.clear()).await?;
        if state.verbose {
            info!("Cleared cache: removed {} entries", removed);
        }
        Ok(removed)
    }

    /// Computes statistics live from the store.
    pub async fn get_cache_stats(&self) -> Result<CachingStats> {
        let state = self.session().await?;
        run_blocking(&state.store, |store| store.stats(current_timestamp_ms())).await
    }

    /// Deletes every entry already expired, returning how many were removed.
    pub async fn purge_expired(&self) -> Result<usize> {
        let state = self.session().await?;
        let removed =
            run_blocking(&state.store, |store| store.delete_expired(current_timestamp_ms()))
                .await?;
        if state.verbose {
            info!("Purged {} expired entries", removed);
        }
        Ok(removed)
    }

    /// Metadata for the row stored under `key`, expired or not.
    pub async fn entry_info(&self, key: &str) -> Result<Option<EntryInfo>> {
        let state = self.session().await?;
        let target = key.to_string();
        let entry = run_blocking(&state.store, move |store| store.get(&target)).await?;
        Ok(entry.as_ref().map(EntryInfo::from))
    }
}

/// Runs a store operation on the blocking pool.
async fn run_blocking<R, F>(store: &Arc<Mutex<CacheStore>>, op: F) -> Result<R>
where
    R: Send + 'static,
    F: FnOnce(&mut CacheStore) -> Result<R> + Send + 'static,
{
    let store = Arc::clone(store);
    task::spawn_blocking(move || {
        let mut guard = store
            .lock()
            .map_err(|_| CacheError::Internal("cache store lock poisoned".to_string()))?;
        op(&mut guard)
    })
    .await
    .map_err(map_join_error)?
}

fn map_join_error(err: task::JoinError) -> CacheError {
    if err.is_cancelled() {
        CacheError::Internal("blocking cache store task cancelled".to_string())
    } else {
        CacheError::Internal(format!("blocking cache store task failed: {err}"))
    }
}
