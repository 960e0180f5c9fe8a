//! Document store trait for package metadata, aggregates and API keys.
//!
//! Documents are flat JSON objects addressed by `(collection, key)`.
//! Implementations must order listings by key and must implement
//! [`DocumentStore::increment`] atomically on the store side.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::result::AppResult;

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Key within its collection.
    pub key: String,
    /// Top-level fields.
    pub fields: Map<String, Value>,
}

impl Document {
    /// Read a string field.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Read an unsigned integer field, defaulting to zero.
    pub fn u64_field(&self, name: &str) -> u64 {
        self.fields.get(name).and_then(Value::as_u64).unwrap_or(0)
    }

    /// Deserialize the fields into a typed value.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> AppResult<T> {
        Ok(serde_json::from_value(Value::Object(self.fields.clone()))?)
    }
}

/// Parameters for [`DocumentStore::find`].
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    /// Only documents whose top-level `field` equals `value`.
    pub filter: Option<(String, Value)>,
    /// Only documents whose key sorts strictly after this one.
    pub start_after: Option<String>,
    /// Maximum number of documents returned.
    pub limit: Option<usize>,
}

impl DocumentQuery {
    /// Query matching every document in a collection.
    pub fn all() -> Self {
        Self::default()
    }

    /// Query matching documents where `field == value`.
    pub fn field_eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            filter: Some((field.into(), value.into())),
            ..Self::default()
        }
    }

    /// Continue after the given key.
    pub fn after(mut self, key: Option<String>) -> Self {
        self.start_after = key;
        self
    }

    /// Cap the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document satisfies the filter and cursor.
    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(after) = &self.start_after {
            if doc.key.as_str() <= after.as_str() {
                return false;
            }
        }
        match &self.filter {
            Some((field, value)) => doc.fields.get(field) == Some(value),
            None => true,
        }
    }
}

/// Keyed JSON document storage.
#[async_trait]
pub trait DocumentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the store type identifier (e.g. `"memory"`, `"redis"`).
    fn store_type(&self) -> &str;

    /// Check whether the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Fetch a document by key.
    async fn get(&self, collection: &str, key: &str) -> AppResult<Option<Document>>;

    /// Create a document only if the key is unused.
    ///
    /// Returns `false` without writing when the key already exists.
    async fn create(&self, collection: &str, key: &str, fields: Map<String, Value>)
    -> AppResult<bool>;

    /// Upsert the given top-level fields, leaving the others untouched.
    async fn merge(&self, collection: &str, key: &str, fields: Map<String, Value>) -> AppResult<()>;

    /// Documents matching `query`, ordered by key ascending.
    async fn find(&self, collection: &str, query: &DocumentQuery) -> AppResult<Vec<Document>>;

    /// Atomically add `delta` to an integer field and return the new value.
    ///
    /// A missing document or field counts as zero.
    async fn increment(&self, collection: &str, key: &str, field: &str, delta: i64)
    -> AppResult<i64>;
}
