//! Session cache for immutable reference data
//!
//! Entries are stored behind `Arc` so a value is fully decoded before it is
//! published and readers only ever see whole values. Entries are replaced or
//! dropped, never mutated. There is no TTL and no eviction.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

#[derive(Debug)]
pub struct ResponseCache<V> {
    entries: RwLock<HashMap<String, Arc<V>>>,
}

impl<V> Default for ResponseCache<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V> ResponseCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<Arc<V>> {
        self.entries.read().await.get(key).cloned()
    }

    /// Publish a decoded value, replacing any previous entry wholesale
    pub async fn put(&self, key: impl Into<String>, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.entries
            .write()
            .await
            .insert(key.into(), Arc::clone(&value));
        value
    }

    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        tracing::debug!("Invalidating {} cached entries", entries.len());
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Keys currently populated, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}
