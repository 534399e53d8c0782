//! Cache types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use synthesis_engine::SynthesisOutput;

/// Cache manager settings
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding cache-managed audio files
    pub cache_dir: PathBuf,
    /// Eviction keeps the summed entry size at or below this
    pub max_cache_bytes: u64,
    /// Longest a single engine call may take
    pub engine_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./cache/speech"),
            max_cache_bytes: 100_000_000, // 100MB
            engine_timeout: Duration::from_secs(30),
        }
    }
}

/// How a request was served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Served from an existing, verified entry
    Hit,
    /// Synthesized and inserted into the cache
    Miss,
    /// Written to a caller-chosen path, cache untouched
    Direct,
}

/// Result of a successful request
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOutcome {
    pub output: SynthesisOutput,
    pub status: CacheStatus,
    /// Cache key; `None` for direct requests
    pub key: Option<String>,
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
    pub total_size: u64,
    pub max_size: u64,
    pub hits: u64,
    pub misses: u64,
    pub self_heals: u64,
    pub evictions: u64,
}
