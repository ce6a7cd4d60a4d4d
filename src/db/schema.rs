//! Index schema and the small key/value properties store.

use anyhow::{Context, Result};
use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::StoreError;

/// Millis-since-epoch timestamp of the last fully committed sync. Rows
/// stamped after this value belong to an interrupted sync and are purged
/// on the next run.
pub const PROP_LAST_SYNC: &str = "last_sync_millis";

const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS candidate (
    row_id INTEGER PRIMARY KEY AUTOINCREMENT,
    contact_id INTEGER NOT NULL,
    display_name TEXT,
    number TEXT,
    lookup_key TEXT,
    photo_id INTEGER,
    starred INTEGER NOT NULL DEFAULT 0,
    is_super_primary INTEGER NOT NULL DEFAULT 0,
    is_primary INTEGER NOT NULL DEFAULT 0,
    in_visible_group INTEGER NOT NULL DEFAULT 0,
    last_time_used INTEGER NOT NULL DEFAULT 0,
    times_used INTEGER NOT NULL DEFAULT 0,
    indexed_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_candidate_contact ON candidate (contact_id);
CREATE INDEX IF NOT EXISTS idx_candidate_indexed_at ON candidate (indexed_at);

CREATE TABLE IF NOT EXISTS prefix (
    contact_id INTEGER NOT NULL,
    prefix TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_prefix_prefix ON prefix (prefix);
CREATE INDEX IF NOT EXISTS idx_prefix_contact ON prefix (contact_id);

CREATE TABLE IF NOT EXISTS properties (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(DDL)
        .execute(pool)
        .await
        .context("failed to create index schema")?;
    Ok(())
}

pub async fn get_property<'e, E>(executor: E, key: &str) -> Result<Option<String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM properties WHERE key = ?")
        .bind(key)
        .fetch_optional(executor)
        .await
        .with_context(|| format!("failed to read property {key}"))?;
    Ok(row.map(|(value,)| value))
}

pub async fn set_property<'e, E>(executor: E, key: &str, value: &str) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO properties (key, value) VALUES (?, ?) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(executor)
    .await
    .with_context(|| format!("failed to write property {key}"))?;
    Ok(())
}

/// 0 when the index has never completed a sync.
pub async fn last_sync_millis(pool: &SqlitePool) -> Result<i64> {
    match get_property(pool, PROP_LAST_SYNC).await? {
        None => Ok(0),
        Some(value) => value.parse::<i64>().map_err(|e| {
            StoreError::Property {
                key: PROP_LAST_SYNC,
                reason: e.to_string(),
            }
            .into()
        }),
    }
}
