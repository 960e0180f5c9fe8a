//! API keys managed in the document store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde_json::{Map, Value};

use feedhub_auth::{AccessLevel, AccessResolver, resolve_level};
use feedhub_core::result::AppResult;
use feedhub_core::traits::document_store::{DocumentQuery, DocumentStore};

const FIELD_ACCESS: &str = "access";
const FIELD_REFERENCE: &str = "reference";

/// Key documents `{ access: "ReadOnly" | "ReadWrite", reference }`, one per key.
#[derive(Debug)]
pub struct KeyRegistry {
    documents: Arc<dyn DocumentStore>,
    collection: String,
    /// Resolved levels, when caching is enabled.
    cache: Option<Cache<String, AccessLevel>>,
}

impl KeyRegistry {
    /// `cache_ttl_seconds == 0` looks every key up on every request.
    pub fn new(documents: Arc<dyn DocumentStore>, collection: &str, cache_ttl_seconds: u64) -> Self {
        let cache = (cache_ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(cache_ttl_seconds))
                .build()
        });
        Self {
            documents,
            collection: collection.to_string(),
            cache,
        }
    }

    /// Add or replace a key.
    pub async fn register(&self, key: &str, level: AccessLevel, reference: &str) -> AppResult<()> {
        let mut fields = Map::new();
        fields.insert(FIELD_ACCESS.to_string(), Value::from(level.to_string()));
        fields.insert(FIELD_REFERENCE.to_string(), Value::from(reference));
        self.documents.merge(&self.collection, key, fields).await?;
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
        Ok(())
    }

    async fn any_with(&self, level: AccessLevel) -> AppResult<bool> {
        let query = DocumentQuery::field_eq(FIELD_ACCESS, level.to_string()).limit(1);
        Ok(!self.documents.find(&self.collection, &query).await?.is_empty())
    }

    async fn lookup(&self, key: &str) -> AppResult<AccessLevel> {
        let any_read_only = self.any_with(AccessLevel::ReadOnly).await?;
        let any_read_write = self.any_with(AccessLevel::ReadWrite).await?;

        let tier = if key.is_empty() {
            None
        } else {
            self.documents
                .get(&self.collection, key)
                .await?
                .and_then(|doc| doc.str_field(FIELD_ACCESS).and_then(AccessLevel::from_tier_name))
        };

        Ok(resolve_level(tier, any_read_only, any_read_write))
    }
}

#[async_trait]
impl AccessResolver for KeyRegistry {
    async fn access_level(&self, key: &str) -> AppResult<AccessLevel> {
        if let Some(cache) = &self.cache {
            if let Some(level) = cache.get(key).await {
                return Ok(level);
            }
        }
        let level = self.lookup(key).await?;
        if let Some(cache) = &self.cache {
            cache.insert(key.to_string(), level).await;
        }
        Ok(level)
    }
}
