//! Cache manager: lookup, self-heal, synthesis on miss and LRU eviction

use crate::error::Result;
use crate::inflight::KeyLocks;
use crate::normalize::{normalize, NormalizedRequest};
use crate::types::{CacheConfig, CacheOutcome, CacheStats, CacheStatus};
use audio_cache_db::{CacheEntry, CacheStore, StoreError};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use synthesis_engine::{EngineFailure, SynthesisEngine, SynthesisOutput, SynthesisParams};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Generate a cache key from canonical synthesis parameters
///
/// Every field is length-prefixed so no two parameter sets share a byte
/// stream. Extensions are visited in sorted key order.
pub fn cache_key(params: &SynthesisParams) -> String {
    fn feed(hasher: &mut Sha256, field: &str) {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }

    let mut hasher = Sha256::new();
    feed(&mut hasher, &params.output_format);
    feed(&mut hasher, &params.voice_id);
    feed(&mut hasher, &params.sample_rate);
    feed(&mut hasher, params.text_type.as_str());
    feed(&mut hasher, &params.text);
    for (name, value) in &params.extensions {
        feed(&mut hasher, name);
        feed(&mut hasher, &value.to_string());
    }
    hex::encode(hasher.finalize())
}

/// Hands out strictly increasing access timestamps
struct AccessClock {
    last_micros: AtomicI64,
}

impl AccessClock {
    fn starting_after(seed: Option<DateTime<Utc>>) -> Self {
        Self {
            last_micros: AtomicI64::new(seed.map(|t| t.timestamp_micros()).unwrap_or(0)),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let prev = self
            .last_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(wall.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        DateTime::from_timestamp_micros(wall.max(prev + 1)).unwrap_or_else(Utc::now)
    }
}

/// Delete a file, treating "already gone" as success
async fn remove_file_if_present(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = ?path, error = %e, "Failed to delete audio file"),
    }
}

/// Serves synthesis requests from a size-bounded audio cache
///
/// Requests without an explicit output path are keyed by their canonical
/// parameters. A hit returns the stored file; a miss calls the engine, records
/// the produced file and then evicts least recently used entries until the
/// cache fits its byte budget again. At most one request per key is in flight.
pub struct CacheManager {
    store: CacheStore,
    engine: Arc<dyn SynthesisEngine>,
    config: CacheConfig,
    locks: KeyLocks,
    /// Serializes eviction passes
    eviction: Mutex<()>,
    clock: AccessClock,
    hits: AtomicU64,
    misses: AtomicU64,
    self_heals: AtomicU64,
    evictions: AtomicU64,
}

impl CacheManager {
    /// Create the cache directory and prepare a manager over `store`
    pub async fn open(
        store: CacheStore,
        engine: Arc<dyn SynthesisEngine>,
        mut config: CacheConfig,
    ) -> Result<Self> {
        fs::create_dir_all(&config.cache_dir).await?;
        config.cache_dir = fs::canonicalize(&config.cache_dir).await?;

        let seed = store.latest_access().await?;
        info!(
            cache_dir = ?config.cache_dir,
            max_cache_bytes = config.max_cache_bytes,
            engine = engine.name(),
            "Cache initialized"
        );

        Ok(Self {
            store,
            engine,
            config,
            locks: KeyLocks::new(),
            eviction: Mutex::new(()),
            clock: AccessClock::starting_after(seed),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            self_heals: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        })
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn engine(&self) -> &Arc<dyn SynthesisEngine> {
        &self.engine
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Normalize a raw request and serve it
    pub async fn synthesize_text(
        &self,
        text: &str,
        metadata: Option<&str>,
    ) -> Result<CacheOutcome> {
        let request = normalize(text, metadata)?;
        self.synthesize(request).await
    }

    /// Serve a normalized request
    pub async fn synthesize(&self, request: NormalizedRequest) -> Result<CacheOutcome> {
        match request.output_path {
            Some(path) => self.synthesize_direct(&request.params, &path).await,
            None => self.synthesize_cached(&request.params).await,
        }
    }

    /// Path a cache-managed file for `key` is written to
    pub fn entry_path(&self, key: &str, params: &SynthesisParams) -> PathBuf {
        self.config
            .cache_dir
            .join(format!("voice_{}.{}", key, params.file_extension()))
    }

    /// The caller manages the file; the store is never consulted
    async fn synthesize_direct(
        &self,
        params: &SynthesisParams,
        path: &Path,
    ) -> Result<CacheOutcome> {
        debug!(path = ?path, "Synthesizing to caller-managed path");
        let output = self.invoke_engine(params, path, false).await?;

        Ok(CacheOutcome {
            output,
            status: CacheStatus::Direct,
            key: None,
        })
    }

    async fn synthesize_cached(&self, params: &SynthesisParams) -> Result<CacheOutcome> {
        let key = cache_key(params);
        let _in_flight = self.locks.lock(&key).await;

        if let Some(output) = self.lookup(&key).await? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, path = ?output.audio_file, "Cache hit");
            return Ok(CacheOutcome {
                output,
                status: CacheStatus::Hit,
                key: Some(key),
            });
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let output = self.fill(&key, params).await?;

        if let Err(e) = self.evict(&key).await {
            error!(key = %key, error = %e, "Eviction pass failed");
        }

        Ok(CacheOutcome {
            output,
            status: CacheStatus::Miss,
            key: Some(key),
        })
    }

    /// Find a usable entry, dropping it if its file has vanished
    async fn lookup(&self, key: &str) -> Result<Option<SynthesisOutput>> {
        let Some(entry) = self.store.find(key).await? else {
            return Ok(None);
        };

        if fs::try_exists(&entry.file_path).await.unwrap_or(false) {
            self.store.touch(key, self.clock.now()).await?;
            return Ok(Some(SynthesisOutput {
                audio_file: entry.file_path,
                audio_type: entry.audio_type,
                provider_metadata: serde_json::Value::String(String::new()),
            }));
        }

        warn!(
            key = %key,
            path = ?entry.file_path,
            "Cached file missing on disk, removing entry"
        );
        self.store.remove(key).await?;
        self.self_heals.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    /// Synthesize into the key's derived path and record the result
    async fn fill(&self, key: &str, params: &SynthesisParams) -> Result<SynthesisOutput> {
        let path = self.entry_path(key, params);
        debug!(key = %key, path = ?path, "Cache miss, synthesizing");

        let output = self.invoke_engine(params, &path, true).await?;
        let size_bytes = fs::metadata(&output.audio_file).await?.len();

        let entry = CacheEntry {
            key: key.to_string(),
            file_path: output.audio_file.clone(),
            audio_type: output.audio_type.clone(),
            size_bytes,
            last_accessed: self.clock.now(),
        };

        match self.store.upsert(&entry).await {
            Ok(()) => info!(key = %key, size_bytes, path = ?entry.file_path, "Cached new audio"),
            Err(StoreError::DuplicateKey(existing)) => {
                error!(key = %existing, "Entry already present for a key being filled")
            }
            Err(e) => return Err(e.into()),
        }

        Ok(output)
    }

    /// Run the engine under the configured timeout
    ///
    /// A timed out call never leaves a file at `path`. Failed calls also clean
    /// up when the path is cache-managed.
    async fn invoke_engine(
        &self,
        params: &SynthesisParams,
        path: &Path,
        cache_managed: bool,
    ) -> Result<SynthesisOutput> {
        let call = self.engine.synthesize(params, path);

        match tokio::time::timeout(self.config.engine_timeout, call).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(failure)) => {
                warn!(engine = self.engine.name(), error = %failure, "Synthesis failed");
                if cache_managed {
                    remove_file_if_present(path).await;
                }
                Err(failure.into())
            }
            Err(_) => {
                warn!(
                    engine = self.engine.name(),
                    timeout = ?self.config.engine_timeout,
                    "Synthesis timed out"
                );
                remove_file_if_present(path).await;
                Err(EngineFailure::timeout(format!(
                    "engine did not finish within {:?}",
                    self.config.engine_timeout
                ))
                .into())
            }
        }
    }

    /// Evict least recently used entries until the cache fits its budget
    ///
    /// The last remaining entry is never evicted. Keys with a request in
    /// flight (including `protected`) are skipped for this pass.
    async fn evict(&self, protected: &str) -> std::result::Result<(), StoreError> {
        let _pass = self.eviction.lock().await;
        let mut skipped = HashSet::from([protected.to_string()]);

        loop {
            let (count, total) = self.store.usage().await?;
            if total <= self.config.max_cache_bytes || count <= 1 {
                return Ok(());
            }

            let Some(victim) = self.store.least_recently_used_excluding(&skipped).await? else {
                warn!(
                    total,
                    max = self.config.max_cache_bytes,
                    "Cache over budget but every remaining entry is in use"
                );
                return Ok(());
            };

            let Some(_victim_guard) = self.locks.try_lock(&victim.key).await else {
                debug!(key = %victim.key, "Skipping in-flight entry during eviction");
                skipped.insert(victim.key);
                continue;
            };

            // A hit may have refreshed the entry before we took its lock
            let current = self.store.find(&victim.key).await?;
            if current.map(|e| e.last_accessed) != Some(victim.last_accessed) {
                continue;
            }

            remove_file_if_present(&victim.file_path).await;
            self.store.remove(&victim.key).await?;
            self.evictions.fetch_add(1, Ordering::Relaxed);
            info!(
                key = %victim.key,
                size = victim.size_bytes,
                remaining = total.saturating_sub(victim.size_bytes),
                "Evicted least recently used entry"
            );
        }
    }

    /// Get current cache statistics
    pub async fn stats(&self) -> Result<CacheStats> {
        let (entries, total_size) = self.store.usage().await?;
        Ok(CacheStats {
            entries,
            total_size,
            max_size: self.config.max_cache_bytes,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            self_heals: self.self_heals.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        })
    }
}
