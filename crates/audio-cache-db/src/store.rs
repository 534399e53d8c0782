//! Typed store handle over the `cache_entries` table

use crate::entries;
use crate::error::{Result, StoreError};
use crate::types::{micros_to_datetime, CacheEntry, CacheEntryRow};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::debug;

/// Handle to the cache metadata table
///
/// Every operation is a single SQL statement, so callers never observe a
/// half-applied mutation.
#[derive(Clone)]
pub struct CacheStore {
    pool: SqlitePool,
}

impl CacheStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a database file and bring its schema up to date
    pub async fn open(database_url: &str) -> Result<Self> {
        let pool = crate::connect(database_url).await?;
        crate::migrate(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Throwaway store for tests and ephemeral caches
    pub async fn open_in_memory() -> Result<Self> {
        let pool = crate::connect_in_memory().await?;
        crate::migrate(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn find(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(entries::find(&self.pool, key).await?.map(CacheEntry::from))
    }

    /// Insert a new entry; an existing entry for the key is an error
    pub async fn upsert(&self, entry: &CacheEntry) -> Result<()> {
        let inserted = entries::insert(&self.pool, &CacheEntryRow::from(entry)).await?;
        if !inserted {
            return Err(StoreError::DuplicateKey(entry.key.clone()));
        }
        debug!(key = %entry.key, size = entry.size_bytes, "Inserted cache entry");
        Ok(())
    }

    /// Record an access; returns false if no entry exists for the key
    pub async fn touch(&self, key: &str, timestamp: DateTime<Utc>) -> Result<bool> {
        Ok(entries::touch(&self.pool, key, timestamp.timestamp_micros()).await?)
    }

    /// Remove an entry; removing a missing key is a no-op
    pub async fn remove(&self, key: &str) -> Result<()> {
        if entries::delete(&self.pool, key).await? {
            debug!(key = %key, "Removed cache entry");
        }
        Ok(())
    }

    pub async fn total_size(&self) -> Result<u64> {
        Ok(self.usage().await?.1)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.usage().await?.0)
    }

    /// `(count, total_size)` taken from the same snapshot
    pub async fn usage(&self) -> Result<(u64, u64)> {
        let (count, total) = entries::usage(&self.pool).await?;
        Ok((
            u64::try_from(count).unwrap_or(0),
            u64::try_from(total).unwrap_or(0),
        ))
    }

    pub async fn least_recently_used(&self) -> Result<Option<CacheEntry>> {
        Ok(entries::oldest(&self.pool, 1)
            .await?
            .into_iter()
            .next()
            .map(CacheEntry::from))
    }

    /// Least recently used entry whose key is not in `excluded`
    pub async fn least_recently_used_excluding(
        &self,
        excluded: &HashSet<String>,
    ) -> Result<Option<CacheEntry>> {
        // At most `excluded.len()` of the first `excluded.len() + 1` rows can be skipped
        let limit = i64::try_from(excluded.len() + 1).unwrap_or(i64::MAX);
        Ok(entries::oldest(&self.pool, limit)
            .await?
            .into_iter()
            .find(|row| !excluded.contains(&row.key))
            .map(CacheEntry::from))
    }

    /// Newest access time across all entries
    pub async fn latest_access(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(entries::latest_access(&self.pool)
            .await?
            .map(micros_to_datetime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn entry(key: &str, size: u64, accessed_micros: i64) -> CacheEntry {
        CacheEntry {
            key: key.to_string(),
            file_path: PathBuf::from(format!("/cache/voice_{key}.ogg")),
            audio_type: "ogg_vorbis".to_string(),
            size_bytes: size,
            last_accessed: micros_to_datetime(accessed_micros),
        }
    }

    #[tokio::test]
    async fn test_find_missing() {
        let store = CacheStore::open_in_memory().await.unwrap();
        assert!(store.find("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_and_find() {
        let store = CacheStore::open_in_memory().await.unwrap();
        let e = entry("abc", 100, 1_000);

        store.upsert(&e).await.unwrap();

        assert_eq!(store.find("abc").await.unwrap(), Some(e));
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.total_size().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_upsert_duplicate_key() {
        let store = CacheStore::open_in_memory().await.unwrap();
        store.upsert(&entry("abc", 100, 1_000)).await.unwrap();

        let err = store.upsert(&entry("abc", 5, 2_000)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(ref k) if k == "abc"));

        // First entry untouched
        let found = store.find("abc").await.unwrap().unwrap();
        assert_eq!(found.size_bytes, 100);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_touch_never_moves_backward() {
        let store = CacheStore::open_in_memory().await.unwrap();
        store.upsert(&entry("abc", 1, 5_000)).await.unwrap();

        assert!(store.touch("abc", micros_to_datetime(9_000)).await.unwrap());
        assert!(store.touch("abc", micros_to_datetime(7_000)).await.unwrap());

        let found = store.find("abc").await.unwrap().unwrap();
        assert_eq!(found.last_accessed.timestamp_micros(), 9_000);

        assert!(!store.touch("missing", micros_to_datetime(1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = CacheStore::open_in_memory().await.unwrap();
        store.upsert(&entry("abc", 10, 1)).await.unwrap();

        store.remove("abc").await.unwrap();
        store.remove("abc").await.unwrap();

        assert!(store.find("abc").await.unwrap().is_none());
        assert_eq!(store.usage().await.unwrap(), (0, 0));
    }

    #[tokio::test]
    async fn test_least_recently_used_ordering() {
        let store = CacheStore::open_in_memory().await.unwrap();
        assert!(store.least_recently_used().await.unwrap().is_none());

        store.upsert(&entry("b", 1, 200)).await.unwrap();
        store.upsert(&entry("c", 1, 100)).await.unwrap();
        store.upsert(&entry("a", 1, 100)).await.unwrap();

        // Tie on access time resolved by key
        let lru = store.least_recently_used().await.unwrap().unwrap();
        assert_eq!(lru.key, "a");

        store.touch("a", micros_to_datetime(300)).await.unwrap();
        let lru = store.least_recently_used().await.unwrap().unwrap();
        assert_eq!(lru.key, "c");
    }

    #[tokio::test]
    async fn test_least_recently_used_excluding() {
        let store = CacheStore::open_in_memory().await.unwrap();
        store.upsert(&entry("a", 1, 100)).await.unwrap();
        store.upsert(&entry("b", 1, 200)).await.unwrap();
        store.upsert(&entry("c", 1, 300)).await.unwrap();

        let excluded: HashSet<String> = ["a".to_string(), "b".to_string()].into();
        let lru = store
            .least_recently_used_excluding(&excluded)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lru.key, "c");

        let all: HashSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert!(store
            .least_recently_used_excluding(&all)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_latest_access() {
        let store = CacheStore::open_in_memory().await.unwrap();
        assert!(store.latest_access().await.unwrap().is_none());

        store.upsert(&entry("a", 1, 100)).await.unwrap();
        store.upsert(&entry("b", 1, 700)).await.unwrap();

        let latest = store.latest_access().await.unwrap().unwrap();
        assert_eq!(latest.timestamp_micros(), 700);
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("cache.db").display());

        {
            let store = CacheStore::open(&url).await.unwrap();
            store.upsert(&entry("persisted", 42, 1)).await.unwrap();
            store.pool().close().await;
        }

        let store = CacheStore::open(&url).await.unwrap();
        let found = store.find("persisted").await.unwrap().unwrap();
        assert_eq!(found.size_bytes, 42);
    }
}
