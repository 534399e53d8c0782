use crate::types::CacheEntryRow;
use sqlx::SqlitePool;

const SELECT_ENTRY: &str =
    "SELECT key, file_path, audio_type, size_bytes, last_accessed FROM cache_entries";

/// Get an entry by key
pub async fn find(pool: &SqlitePool, key: &str) -> Result<Option<CacheEntryRow>, sqlx::Error> {
    sqlx::query_as::<_, CacheEntryRow>(&format!("{SELECT_ENTRY} WHERE key = ?"))
        .bind(key)
        .fetch_optional(pool)
        .await
}

/// Insert an entry, returning false if the key is already present
pub async fn insert(pool: &SqlitePool, row: &CacheEntryRow) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO cache_entries (key, file_path, audio_type, size_bytes, last_accessed)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (key) DO NOTHING
        "#,
    )
    .bind(&row.key)
    .bind(&row.file_path)
    .bind(&row.audio_type)
    .bind(row.size_bytes)
    .bind(row.last_accessed)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Move an entry's access time forward (never backward)
pub async fn touch(pool: &SqlitePool, key: &str, last_accessed: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE cache_entries SET last_accessed = MAX(last_accessed, ?) WHERE key = ?",
    )
    .bind(last_accessed)
    .bind(key)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete an entry by key
pub async fn delete(pool: &SqlitePool, key: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cache_entries WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Entry count and summed size, read in one statement
pub async fn usage(pool: &SqlitePool) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(size_bytes), 0) FROM cache_entries")
        .fetch_one(pool)
        .await
}

/// Least recently used entries first; ties go to the smaller key
pub async fn oldest(pool: &SqlitePool, limit: i64) -> Result<Vec<CacheEntryRow>, sqlx::Error> {
    sqlx::query_as::<_, CacheEntryRow>(&format!(
        "{SELECT_ENTRY} ORDER BY last_accessed ASC, key ASC LIMIT ?"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Newest access time in the table
pub async fn latest_access(pool: &SqlitePool) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT MAX(last_accessed) FROM cache_entries")
        .fetch_one(pool)
        .await
}
