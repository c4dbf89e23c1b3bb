//! Key-value store collaborator interface.
//!
//! The aggregator only depends on this trait; the host supplies the engine.
//! Two implementations ship: [`sqlite::SqliteStore`] for real use and
//! [`MemoryStore`] for tests.

pub mod sqlite;

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::descriptor::ResourceDescriptor;

/// Key under which the live descriptor list is persisted.
pub const KEY_URL_STORAGE: &str = "urlStorage";
/// Key under which the previous-session descriptor list is persisted.
pub const KEY_URL_STORAGE_RESTORE: &str = "urlStorageRestore";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[from] sqlx::Error),
    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// External key-value persistence. Values are JSON strings; every call may
/// suspend.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn put_raw(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removes every key (user reset).
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Typed read of a JSON value; a missing key yields `T::default()`.
pub async fn get_json<T: DeserializeOwned + Default>(
    store: &dyn Store,
    key: &str,
) -> Result<T, StoreError> {
    match store.get_raw(key).await? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(T::default()),
    }
}

/// Typed write of a JSON value.
pub async fn put_json<T: Serialize>(
    store: &dyn Store,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    store.put_raw(key, &serde_json::to_string(value)?).await
}

/// Reads a persisted descriptor list (live or restore).
pub async fn get_descriptors(
    store: &dyn Store,
    key: &str,
) -> Result<Vec<ResourceDescriptor>, StoreError> {
    get_json(store, key).await
}

/// Writes a persisted descriptor list (live or restore).
pub async fn put_descriptors(
    store: &dyn Store,
    key: &str,
    descriptors: &[ResourceDescriptor],
) -> Result<(), StoreError> {
    put_json(store, key, &descriptors).await
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    async fn put_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.values.lock().unwrap().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_raw("missing").await.unwrap(), None);

        put_json(&store, "k", &vec![1u32, 2, 3]).await.unwrap();
        let back: Vec<u32> = get_json(&store, "k").await.unwrap();
        assert_eq!(back, vec![1, 2, 3]);

        store.clear().await.unwrap();
        let empty: Vec<u32> = get_json(&store, "k").await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn missing_descriptor_list_defaults_to_empty() {
        let store = MemoryStore::new();
        let list = get_descriptors(&store, KEY_URL_STORAGE).await.unwrap();
        assert!(list.is_empty());
    }
}
