//! Per-key in-flight locks

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Held while a request for one cache key is being served
pub(crate) type KeyGuard = OwnedMutexGuard<()>;

/// Registry of async mutexes, one per cache key currently in use
///
/// Requests for the same key queue behind each other; requests for different
/// keys never contend beyond the brief registry lookup.
#[derive(Default)]
pub(crate) struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait until no other request holds `key`
    pub(crate) async fn lock(&self, key: &str) -> KeyGuard {
        let lock = self.lock_for(key).await;
        lock.lock_owned().await
    }

    /// Take `key` only if nobody else holds it
    pub(crate) async fn try_lock(&self, key: &str) -> Option<KeyGuard> {
        let lock = self.lock_for(key).await;
        lock.try_lock_owned().ok()
    }

    /// Number of keys with a live lock
    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        // The map's own reference is the only one left once a key goes idle
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(key.to_string()).or_default())
    }
}
