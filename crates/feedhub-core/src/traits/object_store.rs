//! Object store trait for package blobs.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// A blob together with the content type it was stored with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Raw bytes.
    pub data: Bytes,
    /// MIME type.
    pub content_type: String,
}

impl StoredObject {
    /// Wrap bytes with a content type.
    pub fn new(data: Bytes, content_type: impl Into<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
        }
    }
}

/// Flat key → blob storage.
///
/// Keys are `/`-separated paths such as `Sample.Plugin/1.0.0/Sample.Plugin.1.0.0.nupkg`.
/// Keys are case-sensitive.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the store type identifier (e.g. `"memory"`, `"s3"`).
    fn store_type(&self) -> &str;

    /// Check whether the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Write a blob, replacing any existing blob at the same key.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<()>;

    /// Read a blob. `Ok(None)` when nothing is stored at `key`.
    async fn get(&self, key: &str) -> AppResult<Option<StoredObject>>;

    /// Check whether a blob exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}
