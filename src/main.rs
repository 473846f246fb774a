//! Remote Cache maintenance tool
//!
//! Inspects and cleans a cache database written by the library.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use remote_cache::{Config, DatabasePath, RemoteCache};

/// Inspect and maintain a remote_cache database
#[derive(Parser, Debug)]
#[command(name = "remote_cache")]
#[command(about = "Inspect and maintain a remote_cache database")]
#[command(version)]
struct Cli {
    /// Database file, or ":memory:" (overrides REMOTE_CACHE_DATABASE_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<String>,

    /// Log cache activity
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print entry count, payload bytes and expired entries as JSON
    Stats,
    /// Print metadata of one entry as JSON
    Inspect { key: String },
    /// Delete one entry
    Forget { key: String },
    /// Delete every entry
    Clear,
    /// Delete expired entries
    Sweep,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remote_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Expired rows stay visible to stats, inspect and sweep
    let mut config = Config::from_env().with_sweep_on_init(false);
    if let Some(raw) = cli.database.as_deref() {
        config = config.with_database_path(DatabasePath::parse(raw));
    }
    if cli.verbose {
        config = config.with_verbose(true);
    }

    let cache = RemoteCache::new();
    cache
        .init(&config)
        .await
        .with_context(|| format!("failed to open cache at {:?}", config.database_path))?;

    let outcome = run(&cache, cli.command).await;
    cache.dispose().await?;
    outcome
}

async fn run(cache: &RemoteCache, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Stats => {
            let stats = cache.get_cache_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Inspect { key } => match cache.entry_info(&key).await? {
            Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
            None => anyhow::bail!("no cache entry for key '{}'", key),
        },
        Command::Forget { key } => {
            let removed = cache.clear_cache_for_key(&key).await?;
            info!("Forget '{}': {}", key, if removed { "removed" } else { "not present" });
        }
        Command::Clear => {
            let removed = cache.clear_cache().await?;
            info!("Cleared {} entries", removed);
        }
        Command::Sweep => {
            let removed = cache.purge_expired().await?;
            info!("Swept {} expired entries", removed);
        }
    }
    Ok(())
}
