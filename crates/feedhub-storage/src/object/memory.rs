//! In-memory object store.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use feedhub_core::result::AppResult;
use feedhub_core::traits::object_store::{ObjectStore, StoredObject};

/// Blobs held in a concurrent map. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: DashMap<String, StoredObject>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn store_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<()> {
        self.objects
            .insert(key.to_string(), StoredObject::new(data, content_type));
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<StoredObject>> {
        Ok(self.objects.get(key).map(|o| o.value().clone()))
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.objects.contains_key(key))
    }
}
