use std::collections::BTreeMap;
use std::sync::RwLock;

use artifex_types::ImageId;
use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::traits::ImageStore;

/// In-memory, `BTreeMap`-based image store.
///
/// Intended for tests and embedding. Replacing a value under the write lock
/// is trivially atomic. Blobs are cloned on read and write.
pub struct InMemoryImageStore {
    blobs: RwLock<BTreeMap<ImageId, Vec<u8>>>,
}

impl InMemoryImageStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryImageStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Poisoned(e.to_string())
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn create(&self, id: &ImageId, bytes: &[u8]) -> StoreResult<()> {
        let mut map = self.blobs.write().map_err(poisoned)?;
        if map.contains_key(id) {
            return Err(StoreError::AlreadyExists(id.clone()));
        }
        map.insert(id.clone(), bytes.to_vec());
        Ok(())
    }

    async fn put(&self, id: &ImageId, bytes: &[u8]) -> StoreResult<()> {
        let mut map = self.blobs.write().map_err(poisoned)?;
        map.insert(id.clone(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, id: &ImageId) -> StoreResult<Vec<u8>> {
        let map = self.blobs.read().map_err(poisoned)?;
        map.get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn entries(&self) -> StoreResult<Vec<String>> {
        let map = self.blobs.read().map_err(poisoned)?;
        Ok(map.keys().map(|id| id.to_string()).collect())
    }
}

impl std::fmt::Debug for InMemoryImageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryImageStore")
            .field("blob_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ImageId {
        ImageId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn create_get_put() {
        let store = InMemoryImageStore::new();
        assert!(store.is_empty());
        store.create(&id("a.png"), b"one").await.unwrap();
        assert_eq!(store.get(&id("a.png")).await.unwrap(), b"one");
        store.put(&id("a.png"), b"two").await.unwrap();
        assert_eq!(store.get(&id("a.png")).await.unwrap(), b"two");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_existing() {
        let store = InMemoryImageStore::new();
        store.create(&id("a.png"), b"one").await.unwrap();
        assert!(matches!(
            store.create(&id("a.png"), b"two").await.unwrap_err(),
            StoreError::AlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn missing_is_not_found() {
        let store = InMemoryImageStore::new();
        assert!(matches!(
            store.get(&id("x.jpg")).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn list_uses_catalog_filter() {
        let store = InMemoryImageStore::new();
        for name in ["a.jpg", "b.txt", "c.PNG"] {
            store.create(&id(name), b"x").await.unwrap();
        }
        let catalog = store.list().await.unwrap();
        assert_eq!(catalog.images, vec![id("a.jpg"), id("c.PNG")]);
    }

    #[test]
    fn debug_format() {
        let debug = format!("{:?}", InMemoryImageStore::new());
        assert!(debug.contains("blob_count"));
    }
}
