//! Key-value storage capability.
//!
//! Authorization records and booking records both live here as plain JSON
//! blobs, in separate key namespaces (`auth-session:<subject>` and
//! `booking:<date>`). The trait keeps the higher layers independent of the
//! backing store; the in-process [`MemoryStore`] is what tests and the
//! default wiring use.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Key prefix for authorization records.
pub const AUTH_NAMESPACE: &str = "auth-session:";

/// Key prefix for completed booking records.
pub const BOOKING_NAMESPACE: &str = "booking:";

/// JSON blob store abstraction.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    async fn put(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List every key under a prefix. Namespaces are small (one auth record
    /// per subject, one booking per date), so a full scan is fine.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// In-memory store.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();

        store
            .put("booking:2025-07-20", serde_json::json!({"court": "Alice Marble"}))
            .await
            .unwrap();

        let value = store.get("booking:2025-07-20").await.unwrap().unwrap();
        assert_eq!(value["court"], "Alice Marble");

        store.delete("booking:2025-07-20").await.unwrap();
        assert!(store.get("booking:2025-07-20").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_keys_respects_namespace() {
        let store = MemoryStore::new();
        store
            .put("auth-session:u1", serde_json::json!({}))
            .await
            .unwrap();
        store
            .put("booking:2025-07-20", serde_json::json!({}))
            .await
            .unwrap();

        let keys = store.list_keys(AUTH_NAMESPACE).await.unwrap();
        assert_eq!(keys, vec!["auth-session:u1".to_string()]);
    }
}
