use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::DatabaseConfig;

const DEFAULT_POOL_SIZE: u32 = 4;
const DEFAULT_ACQUIRE_MS: u64 = 5_000;

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Opens (and creates if missing) the index database.
///
/// File databases run in WAL mode so lookups are not blocked by an index
/// rebuild. An in-memory database is pinned to a single connection: each
/// sqlite `:memory:` connection is its own database, so a larger pool
/// would scatter the index across disjoint stores.
pub async fn make_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let size = if config.is_in_memory() {
        1
    } else {
        env_parse("SMARTDIAL_POOL_SIZE", DEFAULT_POOL_SIZE)
    };
    let acquire_ms = env_parse("SMARTDIAL_ACQUIRE_MS", DEFAULT_ACQUIRE_MS);

    let mut options = SqliteConnectOptions::from_str(&config.to_url())
        .with_context(|| format!("invalid sqlite url for path {}", config.path))?
        .create_if_missing(true);
    if !config.is_in_memory() {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    log::debug!(
        "opening index database at {} (pool size {size})",
        config.path
    );
    SqlitePoolOptions::new()
        .max_connections(size)
        .acquire_timeout(Duration::from_millis(acquire_ms))
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open index database at {}", config.path))
}
