//! Package storage configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend to use: `"local"` or `"cloud"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Maximum upload size in bytes (default 512 MB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Ceiling on the total decompressed size of one package (default 1 GB).
    #[serde(default = "default_max_extracted")]
    pub max_extracted_size_bytes: u64,
    /// Maximum number of entries in one feed page.
    #[serde(default = "default_feed_page_size")]
    pub feed_page_size: usize,
    /// Local filesystem backend configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,
    /// Cloud backend configuration.
    #[serde(default)]
    pub cloud: CloudStorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            max_upload_size_bytes: default_max_upload(),
            max_extracted_size_bytes: default_max_extracted(),
            feed_page_size: default_feed_page_size(),
            local: LocalStorageConfig::default(),
            cloud: CloudStorageConfig::default(),
        }
    }
}

/// Local filesystem backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root path of the package tree.
    #[serde(default = "default_local_root")]
    pub root_path: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
        }
    }
}

/// Cloud backend configuration: an object store for blobs and a document
/// store for metadata, aggregates and counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudStorageConfig {
    /// Object store: `"memory"` or `"s3"`.
    #[serde(default = "default_memory")]
    pub object_store: String,
    /// Document store: `"memory"` or `"redis"`.
    #[serde(default = "default_memory")]
    pub document_store: String,
    /// Collection holding one document per package version.
    #[serde(default = "default_packages_collection")]
    pub packages_collection: String,
    /// Collection holding one aggregate document per package ID.
    #[serde(default = "default_aggregates_collection")]
    pub aggregates_collection: String,
    /// Collection holding API key documents.
    #[serde(default = "default_api_keys_collection")]
    pub api_keys_collection: String,
    /// S3 object store settings.
    #[serde(default)]
    pub s3: S3StorageConfig,
    /// Redis document store settings.
    #[serde(default)]
    pub redis: RedisStoreConfig,
}

impl Default for CloudStorageConfig {
    fn default() -> Self {
        Self {
            object_store: default_memory(),
            document_store: default_memory(),
            packages_collection: default_packages_collection(),
            aggregates_collection: default_aggregates_collection(),
            api_keys_collection: default_api_keys_collection(),
            s3: S3StorageConfig::default(),
            redis: RedisStoreConfig::default(),
        }
    }
}

/// S3-compatible object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3StorageConfig {
    /// Endpoint URL for non-AWS services like MinIO. Empty uses AWS.
    #[serde(default)]
    pub endpoint: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Bucket name.
    #[serde(default)]
    pub bucket: String,
}

impl Default for S3StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: default_region(),
            bucket: String::new(),
        }
    }
}

/// Redis document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisStoreConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Prefix for every key written.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_backend() -> String {
    "local".to_string()
}

fn default_max_upload() -> u64 {
    512 * 1024 * 1024
}

fn default_max_extracted() -> u64 {
    1024 * 1024 * 1024
}

fn default_feed_page_size() -> usize {
    100
}

fn default_local_root() -> String {
    "./data/packages".to_string()
}

fn default_memory() -> String {
    "memory".to_string()
}

fn default_packages_collection() -> String {
    "Nuget-Packages".to_string()
}

fn default_aggregates_collection() -> String {
    "Nuget-Packages-Extra".to_string()
}

fn default_api_keys_collection() -> String {
    "Nuget-APIKeys".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "feedhub:".to_string()
}
