use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::path::PathBuf;

/// Metadata for one cached audio artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub file_path: PathBuf,
    pub audio_type: String,
    pub size_bytes: u64,
    pub last_accessed: DateTime<Utc>,
}

/// Row as stored in `cache_entries`
#[derive(Debug, Clone, FromRow)]
pub struct CacheEntryRow {
    pub key: String,
    pub file_path: String,
    pub audio_type: String,
    pub size_bytes: i64,
    pub last_accessed: i64,
}

impl From<CacheEntryRow> for CacheEntry {
    fn from(row: CacheEntryRow) -> Self {
        Self {
            key: row.key,
            file_path: PathBuf::from(row.file_path),
            audio_type: row.audio_type,
            size_bytes: u64::try_from(row.size_bytes).unwrap_or(0),
            last_accessed: micros_to_datetime(row.last_accessed),
        }
    }
}

impl From<&CacheEntry> for CacheEntryRow {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            key: entry.key.clone(),
            file_path: entry.file_path.to_string_lossy().into_owned(),
            audio_type: entry.audio_type.clone(),
            size_bytes: i64::try_from(entry.size_bytes).unwrap_or(i64::MAX),
            last_accessed: entry.last_accessed.timestamp_micros(),
        }
    }
}

pub(crate) fn micros_to_datetime(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion_keeps_microseconds() {
        let entry = CacheEntry {
            key: "abc".to_string(),
            file_path: PathBuf::from("/cache/voice_abc.ogg"),
            audio_type: "ogg_vorbis".to_string(),
            size_bytes: 100,
            last_accessed: DateTime::from_timestamp_micros(1_700_000_000_123_456).unwrap(),
        };

        let row = CacheEntryRow::from(&entry);
        assert_eq!(row.last_accessed, 1_700_000_000_123_456);
        assert_eq!(row.file_path, "/cache/voice_abc.ogg");

        let back = CacheEntry::from(row);
        assert_eq!(back, entry);
    }
}
