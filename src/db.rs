//! SQLite connection management for the wiki corpus.
//!
//! The wiki database is written by the offline corpus builder and only
//! read at query time. [`connect`] is used by `kh init` and creates the
//! file if needed; [`open_existing`] is used by the query path and fails
//! when the file is missing so the aggregator can report the wiki source
//! as unavailable instead of silently querying an empty database.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Create (if missing) and connect to the database at `db_path`.
///
/// - Creates parent directories and the database file.
/// - Enables WAL journal mode so the builder can write while the bot reads.
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Connect to an existing database without creating it.
pub async fn open_existing(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        anyhow::bail!("wiki database not found: {}", db_path.display());
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(false);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open wiki database: {}", db_path.display()))
}
