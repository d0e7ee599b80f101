//! SQLite database connection management.
//!
//! Provides a connection pool to the SQLite database named by `[db].url`
//! (`DATABASE_URL`). File databases get WAL mode and have their parent
//! directories created automatically; `sqlite::memory:` gets a single
//! long-lived connection so every caller sees the same data.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::DbConfig;

/// Create a connection pool to the configured SQLite database.
///
/// Acquiring a connection is bounded by `[db].timeout_secs`.
///
/// # Errors
///
/// Returns an error if no URL is configured, or if the database cannot be
/// created or connected to.
pub async fn connect(db: &DbConfig) -> Result<SqlitePool> {
    let url = db
        .url
        .as_deref()
        .context("db.url is not set (DATABASE_URL)")?;
    let url = normalize_url(url);
    let file = sqlite_file_path(&url);

    // Ensure parent directory exists
    if let Some(parent) = file.as_ref().and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let mut options = SqliteConnectOptions::from_str(&url)
        .with_context(|| format!("Invalid database URL: {}", url))?
        .create_if_missing(true);
    let mut pool_options = SqlitePoolOptions::new().acquire_timeout(db.timeout());

    if file.is_some() {
        options = options.journal_mode(SqliteJournalMode::Wal);
        pool_options = pool_options.max_connections(db.max_connections);
    } else {
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to {}", url))?;

    Ok(pool)
}

/// Accepts bare file paths as well as `sqlite:` URLs.
fn normalize_url(url: &str) -> String {
    if url.starts_with("sqlite:") {
        url.to_string()
    } else {
        format!("sqlite:{}", url)
    }
}

/// The database file behind a `sqlite:` URL, or `None` for in-memory databases.
fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let rest = rest.split('?').next().unwrap_or(rest);
    if rest.is_empty() || rest == ":memory:" {
        None
    } else {
        Some(PathBuf::from(rest))
    }
}
