//! Cloud backend: blobs in an [`ObjectStore`], metadata in a [`DocumentStore`].
//!
//! Layout:
//! - objects `{ID}/{Version}/{member}` plus the archive at `{ID}/{Version}/{ID}.{Version}.nupkg`
//! - package documents keyed `{ID}.{Version}` holding the record and `id_lower`
//! - aggregate documents keyed `{ID}` holding `latest` and `downloads`

pub mod keys;

pub use keys::KeyRegistry;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use feedhub_auth::{AccessLevel, AccessResolver};
use feedhub_core::config::storage::CloudStorageConfig;
use feedhub_core::error::AppError;
use feedhub_core::result::AppResult;
use feedhub_core::traits::document_store::{Document, DocumentQuery, DocumentStore};
use feedhub_core::traits::object_store::{ObjectStore, StoredObject};
use feedhub_entity::PackageRecord;
use feedhub_entity::package::manifest::{is_valid_id, is_valid_version};
use feedhub_entity::package::record::storage_key;
use feedhub_entity::package::version::max_version;

use crate::archive::{DEFAULT_MAX_EXTRACTED_BYTES, PackageArchive};
use crate::backend::{
    FeedPage, FeedQuery, PACKAGE_CONTENT_TYPE, StorageBackend, StoreOutcome, content_type_for,
};
use crate::locks::KeyedLocks;

const FIELD_ID: &str = "id";
const FIELD_ID_LOWER: &str = "id_lower";
const FIELD_VERSION_DOWNLOADS: &str = "version_download_count";
const FIELD_LATEST: &str = "latest";
const FIELD_DOWNLOADS: &str = "downloads";

/// Per-ID aggregate state.
#[derive(Debug, Clone, Default)]
struct Aggregate {
    latest: Option<String>,
    downloads: u64,
}

impl Aggregate {
    fn from_document(doc: Option<Document>) -> Self {
        doc.map(|doc| Self {
            latest: doc.str_field(FIELD_LATEST).map(str::to_string),
            downloads: doc.u64_field(FIELD_DOWNLOADS),
        })
        .unwrap_or_default()
    }

    fn decorate(&self, record: &mut PackageRecord) {
        record.mark_latest(self.latest.as_deref());
        record.download_count = self.downloads;
    }
}

/// Package storage over an object store and a document store.
#[derive(Debug)]
pub struct CloudStorageBackend {
    objects: Arc<dyn ObjectStore>,
    documents: Arc<dyn DocumentStore>,
    packages: String,
    aggregates: String,
    /// Serializes stores of one ID within this process.
    locks: KeyedLocks,
    access: Arc<dyn AccessResolver>,
    /// Ceiling on the decompressed size of one package.
    max_extracted: u64,
}

impl CloudStorageBackend {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        documents: Arc<dyn DocumentStore>,
        config: &CloudStorageConfig,
        access: Arc<dyn AccessResolver>,
    ) -> Self {
        Self {
            objects,
            documents,
            packages: config.packages_collection.clone(),
            aggregates: config.aggregates_collection.clone(),
            locks: KeyedLocks::new(),
            access,
            max_extracted: DEFAULT_MAX_EXTRACTED_BYTES,
        }
    }

    /// Override the decompressed-size ceiling applied to stored packages.
    pub fn with_max_extracted_bytes(mut self, limit: u64) -> Self {
        self.max_extracted = limit;
        self
    }

    fn package_key(id: &str, version: &str) -> String {
        format!("{id}.{version}")
    }

    fn record_fields(record: &PackageRecord) -> AppResult<Map<String, Value>> {
        let mut fields = match serde_json::to_value(record)? {
            Value::Object(fields) => fields,
            _ => return Err(AppError::serialization("Package record is not an object")),
        };
        fields.insert(
            FIELD_ID_LOWER.to_string(),
            Value::from(record.id().to_lowercase()),
        );
        Ok(fields)
    }

    async fn aggregate(&self, id: &str) -> AppResult<Aggregate> {
        let doc = self.documents.get(&self.aggregates, id).await?;
        Ok(Aggregate::from_document(doc))
    }

    /// The casing under which an ID was first stored, if any version exists.
    async fn canonical_id(&self, id: &str) -> AppResult<Option<String>> {
        let docs = self
            .documents
            .find(
                &self.packages,
                &DocumentQuery::field_eq(FIELD_ID_LOWER, id.to_lowercase()).limit(1),
            )
            .await?;
        Ok(docs
            .first()
            .and_then(|d| d.str_field(FIELD_ID))
            .map(str::to_string))
    }

    /// Recompute and persist the latest version of `id`, counting every
    /// version stored under any casing of it.
    async fn refresh_latest(&self, id: &str) -> AppResult<()> {
        let docs = self
            .documents
            .find(
                &self.packages,
                &DocumentQuery::field_eq(FIELD_ID_LOWER, id.to_lowercase()),
            )
            .await?;
        let versions: Vec<String> = docs
            .iter()
            .filter_map(|d| d.str_field("version").map(str::to_string))
            .collect();
        if let Some(latest) = max_version(versions.iter().map(String::as_str)) {
            let mut fields = Map::new();
            fields.insert(FIELD_LATEST.to_string(), Value::from(latest));
            self.documents.merge(&self.aggregates, id, fields).await?;
        }
        Ok(())
    }

    /// Find the stored document for `(id, version)`, tolerating a wrong-case ID.
    async fn find_package(&self, id: &str, version: &str) -> AppResult<Option<Document>> {
        if let Some(doc) = self
            .documents
            .get(&self.packages, &Self::package_key(id, version))
            .await?
        {
            return Ok(Some(doc));
        }
        let docs = self
            .documents
            .find(
                &self.packages,
                &DocumentQuery::field_eq(FIELD_ID_LOWER, id.to_lowercase()),
            )
            .await?;
        Ok(docs
            .into_iter()
            .find(|d| d.str_field("version") == Some(version)))
    }

    async fn put_blob(&self, key: String, data: Bytes, content_type: String) -> AppResult<()> {
        let len = data.len();
        self.objects.put(&key, data, &content_type).await?;
        debug!(key = %key, bytes = len, "Wrote object");
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for CloudStorageBackend {
    fn backend_type(&self) -> &str {
        "cloud"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.objects.health_check().await? && self.documents.health_check().await?)
    }

    async fn store_package(&self, archive: Bytes) -> AppResult<StoreOutcome> {
        let package = PackageArchive::read_async(archive.clone(), self.max_extracted).await?;
        let mut manifest = package.manifest;

        let _lock = self.locks.lock(&manifest.id.to_lowercase()).await;

        if let Some(canonical) = self.canonical_id(&manifest.id).await? {
            if canonical != manifest.id {
                debug!(id = %manifest.id, canonical = %canonical, "Storing under existing ID casing");
                manifest.id = canonical;
            }
        }
        let id = manifest.id.clone();
        let version = manifest.version.clone();
        let key = Self::package_key(&id, &version);

        if self.find_package(&id, &version).await?.is_some() {
            return Ok(StoreOutcome::AlreadyExists);
        }

        for (name, data) in &package.members {
            self.put_blob(
                storage_key(&id, &version, name),
                data.clone(),
                content_type_for(name),
            )
            .await?;
        }

        let record = PackageRecord::from_archive(manifest, &archive, Utc::now());
        self.put_blob(
            record.storage_key(),
            archive.clone(),
            PACKAGE_CONTENT_TYPE.to_string(),
        )
        .await?;

        let created = self
            .documents
            .create(&self.packages, &key, Self::record_fields(&record)?)
            .await?;
        if !created {
            return Ok(StoreOutcome::AlreadyExists);
        }

        self.refresh_latest(&id).await?;

        info!(id = %id, version = %version, bytes = archive.len(), "Stored package");
        Ok(StoreOutcome::Stored(record))
    }

    async fn get_entry(&self, id: &str, version: &str) -> AppResult<PackageRecord> {
        let doc = self
            .find_package(id, version)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Package not found: {id} {version}")))?;
        let mut record: PackageRecord = doc.decode()?;
        self.aggregate(record.id()).await?.decorate(&mut record);
        Ok(record)
    }

    async fn get_feed_entries(&self, query: &FeedQuery) -> AppResult<FeedPage> {
        let base = match query.filter() {
            Some(id) => DocumentQuery::field_eq(FIELD_ID_LOWER, id.to_lowercase()),
            None => DocumentQuery::all(),
        };
        let docs = self
            .documents
            .find(
                &self.packages,
                &base.after(query.cursor.clone()).limit(query.limit),
            )
            .await?;

        let full = query.limit > 0 && docs.len() == query.limit;
        let next_cursor = if full {
            docs.last().map(|d| d.key.clone())
        } else {
            None
        };

        let mut aggregates: HashMap<String, Aggregate> = HashMap::new();
        let mut entries = Vec::with_capacity(docs.len());
        for doc in docs {
            let mut record: PackageRecord = match doc.decode() {
                Ok(record) => record,
                Err(e) => {
                    warn!(key = %doc.key, error = %e, "Skipping undecodable package document");
                    continue;
                }
            };
            if !aggregates.contains_key(record.id()) {
                let aggregate = self.aggregate(record.id()).await?;
                aggregates.insert(record.id().to_string(), aggregate);
            }
            if let Some(aggregate) = aggregates.get(record.id()) {
                aggregate.decorate(&mut record);
            }
            entries.push(record);
        }

        Ok(FeedPage {
            entries,
            next_cursor,
        })
    }

    async fn get_file(&self, path: &str) -> AppResult<StoredObject> {
        let path = path.trim_start_matches('/');
        if let Some(object) = self.objects.get(path).await? {
            return Ok(object);
        }

        if let Some((dir, name)) = path.rsplit_once('/') {
            let lowered = name.to_lowercase();
            if lowered != name {
                if let Some(object) = self.objects.get(&format!("{dir}/{lowered}")).await? {
                    return Ok(object);
                }
            }
        }

        Err(AppError::not_found(format!("File not found: {path}")))
    }

    async fn get_package_file(&self, id: &str, version: &str) -> AppResult<StoredObject> {
        if !is_valid_id(id) || !is_valid_version(version) {
            return Err(AppError::not_found(format!("Package not found: {id} {version}")));
        }
        let doc = self
            .find_package(id, version)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Package not found: {id} {version}")))?;
        let canonical_id = doc.str_field(FIELD_ID).unwrap_or(id).to_string();

        let key = storage_key(
            &canonical_id,
            version,
            &format!("{canonical_id}.{version}.nupkg"),
        );
        let object = self
            .objects
            .get(&key)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Package not found: {id} {version}")))?;

        let documents = Arc::clone(&self.documents);
        let packages = self.packages.clone();
        let aggregates = self.aggregates.clone();
        let doc_key = doc.key;
        tokio::spawn(async move {
            if let Err(e) = documents
                .increment(&packages, &doc_key, FIELD_VERSION_DOWNLOADS, 1)
                .await
            {
                warn!(key = %doc_key, error = %e, "Failed to count version download");
            }
            if let Err(e) = documents
                .increment(&aggregates, &canonical_id, FIELD_DOWNLOADS, 1)
                .await
            {
                warn!(id = %canonical_id, error = %e, "Failed to count package download");
            }
        });

        Ok(StoredObject::new(object.data, PACKAGE_CONTENT_TYPE))
    }

    async fn get_access_level(&self, key: &str) -> AppResult<AccessLevel> {
        self.access.access_level(key).await
    }
}
