//! Keyed cache for per-user start node collections
//!
//! A deliberately small get/insert/invalidate abstraction: concurrency
//! safety is part of its contract rather than a property of some global
//! singleton. Values are stored behind `Arc`, so readers hold a consistent
//! snapshot even across an invalidation.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Concurrent map from key to shared value
pub struct KeyedCache<K, V> {
    entries: RwLock<HashMap<K, Arc<V>>>,
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.read().await.get(key).cloned()
    }

    /// Store a fully constructed value. Last writer wins; concurrent
    /// callers computing the same entry is acceptable.
    pub async fn insert(&self, key: K, value: Arc<V>) {
        self.entries.write().await.insert(key, value);
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.write().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl<K, V> Default for KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
