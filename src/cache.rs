//! Versioned memoization store for upstream responses.
//!
//! Entries carry their write timestamp; readers decide what "fresh" means for
//! them, so live scores and slow-moving listings can share one store.

use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

/// Last known response for one fetch key
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub data: Value,
    pub timestamp_ms: i64,
    pub success: bool,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, data: Value, success: bool) -> Self {
        Self {
            key: key.into(),
            data,
            timestamp_ms: Utc::now().timestamp_millis(),
            success,
        }
    }

    pub fn age(&self) -> Duration {
        let elapsed = Utc::now().timestamp_millis() - self.timestamp_ms;
        Duration::from_millis(elapsed.max(0) as u64)
    }

    /// True when the entry is younger than `window`.
    pub fn is_fresh(&self, window: Duration) -> bool {
        self.age() < window
    }
}

/// Thread-safe response cache shared by every fetch.
///
/// Keys are namespaced by `version`; bumping it invalidates everything written
/// by older code without touching unrelated state.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<RwLock<HashMap<String, CacheEntry>>>,
    version: u32,
}

impl CacheStore {
    pub fn new(version: u32) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            version,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    fn namespaced(&self, key: &str) -> String {
        format!("v{}:{}", self.version, key)
    }

    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        let cache = self.inner.read().await;
        cache.get(&self.namespaced(key)).cloned()
    }

    /// Store `data` under `key`, stamped with the current time. Last writer wins.
    pub async fn set(&self, key: &str, data: Value, success: bool) {
        self.insert_entry(CacheEntry::new(key, data, success)).await;
    }

    /// Store a pre-built entry, keeping its timestamp.
    pub async fn insert_entry(&self, entry: CacheEntry) {
        let mut cache = self.inner.write().await;
        cache.insert(self.namespaced(&entry.key), entry);
    }

    /// Remove one key, or every entry when `key` is `None`.
    pub async fn clear(&self, key: Option<&str>) {
        let mut cache = self.inner.write().await;
        match key {
            Some(k) => {
                cache.remove(&self.namespaced(k));
            }
            None => {
                let dropped = cache.len();
                cache.clear();
                info!(entries = dropped, "Cleared response cache");
            }
        }
    }

    /// Drop entries written under a different cache version.
    pub async fn purge_other_versions(&self) -> usize {
        let prefix = format!("v{}:", self.version);
        let mut cache = self.inner.write().await;
        let before = cache.len();
        cache.retain(|k, _| k.starts_with(&prefix));
        before - cache.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Clear everything once the store grows past `max_size`.
    pub async fn cleanup(&self, max_size: usize) {
        let mut cache = self.inner.write().await;
        if cache.len() > max_size {
            cache.clear();
            info!("Cleared response cache (exceeded {} entries)", max_size);
        }
    }

    /// Share the backing map with a store pinned to another version.
    pub fn with_version(&self, version: u32) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            version,
        }
    }
}
