//! In-memory document store.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

use feedhub_core::result::AppResult;
use feedhub_core::traits::document_store::{Document, DocumentQuery, DocumentStore};

type Collection = BTreeMap<String, Map<String, Value>>;

/// Collections of key-ordered documents.
///
/// Every mutation runs under the collection's shard lock, which makes
/// `create` and `increment` atomic.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: DashMap<String, Collection>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn store_type(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn get(&self, collection: &str, key: &str) -> AppResult<Option<Document>> {
        Ok(self.collections.get(collection).and_then(|docs| {
            docs.get(key).map(|fields| Document {
                key: key.to_string(),
                fields: fields.clone(),
            })
        }))
    }

    async fn create(
        &self,
        collection: &str,
        key: &str,
        fields: Map<String, Value>,
    ) -> AppResult<bool> {
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        if docs.contains_key(key) {
            return Ok(false);
        }
        docs.insert(key.to_string(), fields);
        Ok(true)
    }

    async fn merge(&self, collection: &str, key: &str, fields: Map<String, Value>) -> AppResult<()> {
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        let doc = docs.entry(key.to_string()).or_default();
        doc.extend(fields);
        Ok(())
    }

    async fn find(&self, collection: &str, query: &DocumentQuery) -> AppResult<Vec<Document>> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        let lower = match &query.start_after {
            Some(after) => Bound::Excluded(after.as_str()),
            None => Bound::Unbounded,
        };
        let limit = query.limit.unwrap_or(usize::MAX);

        Ok(docs
            .range::<str, _>((lower, Bound::Unbounded))
            .map(|(key, fields)| Document {
                key: key.clone(),
                fields: fields.clone(),
            })
            .filter(|doc| query.matches(doc))
            .take(limit)
            .collect())
    }

    async fn increment(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        delta: i64,
    ) -> AppResult<i64> {
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        let doc = docs.entry(key.to_string()).or_default();
        let next = doc.get(field).and_then(Value::as_i64).unwrap_or(0) + delta;
        doc.insert(field.to_string(), Value::from(next));
        Ok(next)
    }
}
