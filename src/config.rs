//! Configuration Module
//!
//! Initialization options for the cache engine, loadable from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

/// Sentinel accepted by `REMOTE_CACHE_DATABASE_PATH` for an in-memory store.
pub const IN_MEMORY_SENTINEL: &str = ":memory:";

/// File name used under the platform data directory.
pub const DEFAULT_DATABASE_FILE: &str = "remote_cache.db";

/// Default expiration applied when a call supplies neither a duration nor an instant.
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(60 * 60);

// == Database Path ==
/// Where the cache table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabasePath {
    /// Platform application-data directory
    Default,
    /// Explicit database file
    File(PathBuf),
    /// Ephemeral in-memory database, discarded on dispose
    Memory,
}

impl DatabasePath {
    /// Parses an environment/CLI value, honoring the in-memory sentinel.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            DatabasePath::Default
        } else if raw == IN_MEMORY_SENTINEL {
            DatabasePath::Memory
        } else {
            DatabasePath::File(PathBuf::from(raw))
        }
    }

    /// Resolves to a concrete file path, or `None` for in-memory mode.
    ///
    /// Falls back to the working directory when no platform data directory
    /// can be determined (e.g. no home directory).
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            DatabasePath::Memory => None,
            DatabasePath::File(path) => Some(path.clone()),
            DatabasePath::Default => Some(
                ProjectDirs::from("", "", "remote_cache")
                    .map(|dirs| dirs.data_dir().join(DEFAULT_DATABASE_FILE))
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE)),
            ),
        }
    }
}

/// Engine initialization parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Expiration used when a call has no explicit duration or instant
    pub default_cache_duration: Duration,
    /// Emit hit/miss/store logs
    pub verbose_mode: bool,
    /// Location of the SQLite database
    pub database_path: DatabasePath,
    /// Delete expired rows when the store is opened
    pub sweep_on_init: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REMOTE_CACHE_DEFAULT_DURATION` - Default expiration in seconds (default: 3600)
    /// - `REMOTE_CACHE_VERBOSE` - `1`, `true`, `yes` or `on` (default: debug builds only)
    /// - `REMOTE_CACHE_DATABASE_PATH` - Database file, or `:memory:` (default: platform data dir)
    /// - `REMOTE_CACHE_SWEEP_ON_INIT` - Same flag values as verbose (default: on)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_cache_duration: env::var("REMOTE_CACHE_DEFAULT_DURATION")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_cache_duration),
            verbose_mode: env::var("REMOTE_CACHE_VERBOSE")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.verbose_mode),
            database_path: env::var("REMOTE_CACHE_DATABASE_PATH")
                .ok()
                .map(|v| DatabasePath::parse(&v))
                .unwrap_or(defaults.database_path),
            sweep_on_init: env::var("REMOTE_CACHE_SWEEP_ON_INIT")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.sweep_on_init),
        }
    }

    /// Config for an ephemeral in-memory store.
    pub fn in_memory() -> Self {
        Self::default().with_database_path(DatabasePath::Memory)
    }

    pub fn with_default_duration(mut self, duration: Duration) -> Self {
        self.default_cache_duration = duration;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose_mode = verbose;
        self
    }

    pub fn with_database_path(mut self, path: DatabasePath) -> Self {
        self.database_path = path;
        self
    }

    pub fn with_sweep_on_init(mut self, sweep: bool) -> Self {
        self.sweep_on_init = sweep;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_cache_duration: DEFAULT_CACHE_DURATION,
            verbose_mode: cfg!(debug_assertions),
            database_path: DatabasePath::Default,
            sweep_on_init: true,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_cache_duration, Duration::from_secs(3600));
        assert_eq!(config.verbose_mode, cfg!(debug_assertions));
        assert_eq!(config.database_path, DatabasePath::Default);
        assert!(config.sweep_on_init);
    }

    #[test]
    fn test_config_from_env() {
        // Single test owns these variables to avoid races between tests
        env::remove_var("REMOTE_CACHE_DEFAULT_DURATION");
        env::remove_var("REMOTE_CACHE_VERBOSE");
        env::remove_var("REMOTE_CACHE_DATABASE_PATH");
        env::remove_var("REMOTE_CACHE_SWEEP_ON_INIT");

        let config = Config::from_env();
        assert_eq!(config.default_cache_duration, DEFAULT_CACHE_DURATION);
        assert_eq!(config.database_path, DatabasePath::Default);
        assert!(config.sweep_on_init);

        env::set_var("REMOTE_CACHE_DEFAULT_DURATION", "120");
        env::set_var("REMOTE_CACHE_VERBOSE", "yes");
        env::set_var("REMOTE_CACHE_DATABASE_PATH", ":memory:");
        env::set_var("REMOTE_CACHE_SWEEP_ON_INIT", "0");

        let config = Config::from_env();
        assert_eq!(config.default_cache_duration, Duration::from_secs(120));
        assert!(config.verbose_mode);
        assert_eq!(config.database_path, DatabasePath::Memory);
        assert!(!config.sweep_on_init);

        env::set_var("REMOTE_CACHE_DEFAULT_DURATION", "not-a-number");
        env::set_var("REMOTE_CACHE_VERBOSE", "off");
        env::set_var("REMOTE_CACHE_DATABASE_PATH", "/tmp/cache.db");

        let config = Config::from_env();
        assert_eq!(config.default_cache_duration, DEFAULT_CACHE_DURATION);
        assert!(!config.verbose_mode);
        assert_eq!(
            config.database_path,
            DatabasePath::File(PathBuf::from("/tmp/cache.db"))
        );

        env::remove_var("REMOTE_CACHE_DEFAULT_DURATION");
        env::remove_var("REMOTE_CACHE_VERBOSE");
        env::remove_var("REMOTE_CACHE_DATABASE_PATH");
        env::remove_var("REMOTE_CACHE_SWEEP_ON_INIT");
    }

    #[test]
    fn test_database_path_resolve() {
        assert_eq!(DatabasePath::Memory.resolve(), None);
        assert_eq!(
            DatabasePath::parse("data/cache.db").resolve(),
            Some(PathBuf::from("data/cache.db"))
        );

        let default = DatabasePath::Default.resolve().unwrap();
        assert!(default.ends_with(DEFAULT_DATABASE_FILE));
    }

    #[test]
    fn test_builders() {
        let config = Config::in_memory()
            .with_default_duration(Duration::from_millis(250))
            .with_verbose(true)
            .with_sweep_on_init(false);
        assert_eq!(config.database_path, DatabasePath::Memory);
        assert_eq!(config.default_cache_duration, Duration::from_millis(250));
        assert!(config.verbose_mode);
        assert!(!config.sweep_on_init);
    }
}
