//! SQLite-backed metadata store for cached audio artifacts
//!
//! The store maps a cache key to the file it names, the audio type, the size
//! recorded at insertion and the last access time. [`CacheStore`] is a cheap,
//! cloneable handle meant to be injected into whoever manages the cache.

pub mod entries;
pub mod error;
pub mod store;
pub mod types;

pub use error::{Result, StoreError};
pub use sqlx::sqlite::SqlitePool;
pub use store::CacheStore;
pub use types::CacheEntry;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open (creating if missing) the cache database at `database_url`
pub async fn connect(database_url: &str) -> std::result::Result<SqlitePool, sqlx::Error> {
    info!("Connecting to cache database...");
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    info!("Cache database connection established");
    Ok(pool)
}

/// Single-connection in-memory database that lives as long as the pool
pub async fn connect_in_memory() -> std::result::Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

/// Run all database migrations (versioned, tracked in `_sqlx_migrations` table)
pub async fn migrate(pool: &SqlitePool) -> std::result::Result<(), sqlx::Error> {
    info!("Running cache database migrations...");
    sqlx::migrate!()
        .run(pool)
        .await
        .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
    info!("Cache database migrations completed");
    Ok(())
}
