//! In-memory storage.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::KvStore;

/// `KvStore` backed by an in-process ordered map.
///
/// Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_put_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("logs:2025-01").await.unwrap().is_none());

        store.put("logs:2025-01", b"{}".to_vec()).await.unwrap();
        assert_eq!(store.get("logs:2025-01").await.unwrap(), Some(b"{}".to_vec()));

        store.put("logs:2025-01", b"[]".to_vec()).await.unwrap();
        assert_eq!(store.get("logs:2025-01").await.unwrap(), Some(b"[]".to_vec()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn list_keys_filters_by_prefix() {
        let store = MemoryStore::new();
        for key in ["costs:2025-01", "logs:2025-02", "logs:2025-01", "logsx:2025-01"] {
            store.put(key, Vec::new()).await.unwrap();
        }

        let keys = store.list_keys("logs:").await.unwrap();
        assert_eq!(keys, ["logs:2025-01", "logs:2025-02"]);
    }
}
