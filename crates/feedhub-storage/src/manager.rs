//! Backend construction from configuration.

use std::sync::Arc;

use tracing::info;

use feedhub_auth::{AccessPolicy, AccessResolver};
use feedhub_core::config::AppConfig;
use feedhub_core::config::storage::CloudStorageConfig;
use feedhub_core::error::AppError;
use feedhub_core::result::AppResult;
use feedhub_core::traits::document_store::DocumentStore;
use feedhub_core::traits::object_store::ObjectStore;

use crate::backend::StorageBackend;
use crate::cloud::{CloudStorageBackend, KeyRegistry};
use crate::document::MemoryDocumentStore;
use crate::local::LocalStorageBackend;
use crate::object::MemoryObjectStore;

/// Build the configured storage backend with its key resolver.
pub async fn build_backend(config: &AppConfig) -> AppResult<Arc<dyn StorageBackend>> {
    let storage = &config.storage;
    let key_source = config.auth.key_source.as_str();

    match storage.backend.as_str() {
        "local" => {
            if key_source != "config" {
                return Err(AppError::configuration(format!(
                    "Key source '{key_source}' is not available with the local backend"
                )));
            }
            let access: Arc<dyn AccessResolver> = Arc::new(AccessPolicy::from_config(&config.auth));
            let backend = LocalStorageBackend::open(
                &storage.local.root_path,
                access,
                storage.max_extracted_size_bytes,
            )
            .await?;
            info!(root = %storage.local.root_path, "Local storage backend ready");
            Ok(Arc::new(backend))
        }
        "cloud" => {
            let objects = build_object_store(&storage.cloud).await?;
            let documents = build_document_store(&storage.cloud).await?;
            let access: Arc<dyn AccessResolver> = match key_source {
                "config" => Arc::new(AccessPolicy::from_config(&config.auth)),
                "document-store" => Arc::new(KeyRegistry::new(
                    Arc::clone(&documents),
                    &storage.cloud.api_keys_collection,
                    config.auth.cache_ttl_seconds,
                )),
                other => {
                    return Err(AppError::configuration(format!(
                        "Unknown key source: {other}"
                    )));
                }
            };
            info!(
                objects = %objects.store_type(),
                documents = %documents.store_type(),
                key_source,
                "Cloud storage backend ready"
            );
            Ok(Arc::new(
                CloudStorageBackend::new(objects, documents, &storage.cloud, access)
                    .with_max_extracted_bytes(storage.max_extracted_size_bytes),
            ))
        }
        other => Err(AppError::configuration(format!(
            "Unknown storage backend: {other}"
        ))),
    }
}

/// Build the object store named by `object_store`.
pub async fn build_object_store(config: &CloudStorageConfig) -> AppResult<Arc<dyn ObjectStore>> {
    match config.object_store.as_str() {
        "memory" => Ok(Arc::new(MemoryObjectStore::new())),
        #[cfg(feature = "s3")]
        "s3" => Ok(Arc::new(crate::object::S3ObjectStore::connect(&config.s3).await?)),
        other => Err(AppError::configuration(format!(
            "Unknown or disabled object store: {other}"
        ))),
    }
}

/// Build the document store named by `document_store`.
pub async fn build_document_store(
    config: &CloudStorageConfig,
) -> AppResult<Arc<dyn DocumentStore>> {
    match config.document_store.as_str() {
        "memory" => Ok(Arc::new(MemoryDocumentStore::new())),
        #[cfg(feature = "redis-backend")]
        "redis" => Ok(Arc::new(
            crate::document::RedisDocumentStore::connect(&config.redis).await?,
        )),
        other => Err(AppError::configuration(format!(
            "Unknown or disabled document store: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedhub_core::error::ErrorKind;

    #[tokio::test]
    async fn test_builds_local_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.local.root_path = dir.path().to_string_lossy().to_string();
        let backend = build_backend(&config).await.unwrap();
        assert_eq!(backend.backend_type(), "local");
    }

    #[tokio::test]
    async fn test_builds_cloud_backend_on_memory_stores() {
        let mut config = AppConfig::default();
        config.storage.backend = "cloud".to_string();
        config.auth.key_source = "document-store".to_string();
        let backend = build_backend(&config).await.unwrap();
        assert_eq!(backend.backend_type(), "cloud");
        assert!(backend.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_local_backend_rejects_document_store_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.local.root_path = dir.path().to_string_lossy().to_string();
        config.auth.key_source = "document-store".to_string();
        let err = build_backend(&config).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_unknown_backend() {
        let mut config = AppConfig::default();
        config.storage.backend = "ftp".to_string();
        let err = build_backend(&config).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
