//! Integration tests for the maintenance binary
//!
//! Runs the built executable against temporary database files.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use remote_cache::{CallOptions, Config, DatabasePath, RemoteCache};

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_remote_cache"))
        .args(args)
        .env_remove("REMOTE_CACHE_DATABASE_PATH")
        .env_remove("REMOTE_CACHE_SWEEP_ON_INIT")
        .output()
        .expect("Failed to execute remote_cache")
}

/// Writes two unexpired entries into the database at `path`.
async fn seed(path: &Path) {
    let cache = RemoteCache::new();
    cache
        .init(&Config::default().with_database_path(DatabasePath::File(path.to_path_buf())))
        .await
        .unwrap();
    for key in ["alpha", "beta"] {
        let _: String = cache
            .call::<_, anyhow::Error, _, _>(
                key,
                || async move { Ok(format!("value-{key}")) },
                CallOptions::primitive(),
            )
            .await
            .unwrap();
    }
    cache.dispose().await.unwrap();
}

/// Writes one entry that expires almost immediately and one that stays live.
async fn seed_with_expiring(path: &Path) {
    let cache = RemoteCache::new();
    cache
        .init(&Config::default().with_database_path(DatabasePath::File(path.to_path_buf())))
        .await
        .unwrap();
    let _: String = cache
        .call::<_, anyhow::Error, _, _>(
            "short",
            || async { Ok("s".to_string()) },
            CallOptions::primitive().cache_duration(Duration::from_millis(50)),
        )
        .await
        .unwrap();
    let _: String = cache
        .call::<_, anyhow::Error, _, _>(
            "long",
            || async { Ok("l".to_string()) },
            CallOptions::primitive(),
        )
        .await
        .unwrap();
    cache.dispose().await.unwrap();
}

fn stats_of(db: &str) -> serde_json::Value {
    let output = run_cli(&["--database", db, "stats"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("stats"), "Help should mention the stats command");
    assert!(stdout.contains("clear"), "Help should mention the clear command");
}

#[test]
fn test_missing_command_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success());
}

#[tokio::test]
async fn test_stats_reports_seeded_entries() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cache.db");
    seed(&db).await;

    let output = run_cli(&["--database", db.to_str().unwrap(), "stats"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["totalEntries"], 2);
    assert_eq!(stats["expiredEntries"], 0);
    assert!(stats["totalSizeBytes"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_forget_then_inspect() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cache.db");
    seed(&db).await;
    let db = db.to_str().unwrap();

    let inspect = run_cli(&["--database", db, "inspect", "alpha"]);
    assert!(inspect.status.success());
    let info: serde_json::Value = serde_json::from_slice(&inspect.stdout).unwrap();
    assert_eq!(info["key"], "alpha");
    assert_eq!(info["expired"], false);

    assert!(run_cli(&["--database", db, "forget", "alpha"]).status.success());
    assert!(!run_cli(&["--database", db, "inspect", "alpha"]).status.success());
    assert!(run_cli(&["--database", db, "inspect", "beta"]).status.success());
}

#[tokio::test]
async fn test_clear_empties_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cache.db");
    seed(&db).await;
    let db = db.to_str().unwrap();

    assert!(run_cli(&["--database", db, "clear"]).status.success());

    let output = run_cli(&["--database", db, "stats"]);
    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["totalEntries"], 0);
}

#[tokio::test]
async fn test_stats_and_sweep_see_expired_entries() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("cache.db");
    seed_with_expiring(&db).await;
    tokio::time::sleep(Duration::from_millis(150)).await;
    let db = db.to_str().unwrap();

    let stats = stats_of(db);
    assert_eq!(stats["totalEntries"], 2);
    assert_eq!(stats["expiredEntries"], 1);

    let inspect = run_cli(&["--database", db, "inspect", "short"]);
    assert!(inspect.status.success());
    let info: serde_json::Value = serde_json::from_slice(&inspect.stdout).unwrap();
    assert_eq!(info["expired"], true);
    assert_eq!(info["ttlRemainingMs"], 0);
    assert!(info["expiresAtUtc"].is_string());

    assert!(run_cli(&["--database", db, "sweep"]).status.success());

    let stats = stats_of(db);
    assert_eq!(stats["totalEntries"], 1);
    assert_eq!(stats["expiredEntries"], 0);
    assert!(!run_cli(&["--database", db, "inspect", "short"]).status.success());
    assert!(run_cli(&["--database", db, "inspect", "long"]).status.success());
}
