//! Redis document store (requires the `redis-backend` feature).
//!
//! Each document is a hash at `{prefix}{collection}:doc:{key}` whose values
//! are JSON-encoded fields. A sorted set at `{prefix}{collection}:keys`
//! (all scores zero) keeps keys in lexicographic order for listings.
//! Integers are stored as plain JSON numbers, so `HINCRBY` works on them
//! directly.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::Client;
use redis::aio::ConnectionManager;
use serde_json::{Map, Value};
use tracing::info;

use feedhub_core::config::storage::RedisStoreConfig;
use feedhub_core::error::{AppError, ErrorKind};
use feedhub_core::result::AppResult;
use feedhub_core::traits::document_store::{Document, DocumentQuery, DocumentStore};

/// Marker field written by `HSETNX` to make `create` conditional.
const KEY_FIELD: &str = "__key";

/// Redis-backed document store.
#[derive(Clone)]
pub struct RedisDocumentStore {
    /// Redis connection manager (pooled, reconnecting).
    conn: ConnectionManager,
    /// Key prefix for all keys.
    key_prefix: String,
}

impl std::fmt::Debug for RedisDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisDocumentStore")
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl RedisDocumentStore {
    /// Connect using the `[storage.cloud.redis]` settings.
    pub async fn connect(config: &RedisStoreConfig) -> AppResult<Self> {
        info!(url = %mask_redis_url(&config.url), "Connecting to Redis document store");

        let client = Client::open(config.url.as_str()).map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid Redis URL", e)
        })?;
        let conn = ConnectionManager::new(client).await.map_err(Self::map_err)?;

        info!("Successfully connected to Redis");
        Ok(Self {
            conn,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn map_err(e: redis::RedisError) -> AppError {
        AppError::with_source(ErrorKind::BackendUnavailable, format!("Redis error: {e}"), e)
    }

    fn doc_key(&self, collection: &str, key: &str) -> String {
        format!("{}{collection}:doc:{key}", self.key_prefix)
    }

    fn index_key(&self, collection: &str) -> String {
        format!("{}{collection}:keys", self.key_prefix)
    }

    async fn write_fields(&self, collection: &str, key: &str, fields: &Map<String, Value>) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();
        if !fields.is_empty() {
            let mut hset = redis::cmd("HSET");
            hset.arg(self.doc_key(collection, key));
            for (field, value) in fields {
                hset.arg(field).arg(value.to_string());
            }
            pipe.add_command(hset).ignore();
        }
        pipe.cmd("HSETNX")
            .arg(self.doc_key(collection, key))
            .arg(KEY_FIELD)
            .arg(key)
            .ignore();
        pipe.cmd("ZADD")
            .arg(self.index_key(collection))
            .arg(0)
            .arg(key)
            .ignore();
        let _: () = pipe.query_async(&mut conn).await.map_err(Self::map_err)?;
        Ok(())
    }
}

fn decode_fields(raw: HashMap<String, String>) -> Map<String, Value> {
    raw.into_iter()
        .filter(|(field, _)| field != KEY_FIELD)
        .map(|(field, value)| {
            let parsed = serde_json::from_str(&value).unwrap_or(Value::String(value));
            (field, parsed)
        })
        .collect()
}

/// Mask password in Redis URL for safe logging.
fn mask_redis_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
            if colon_pos > scheme_end {
                return format!("{}:****@{}", &url[..colon_pos], &url[at_pos + 1..]);
            }
        }
    }
    url.to_string()
}

#[async_trait]
impl DocumentStore for RedisDocumentStore {
    fn store_type(&self) -> &str {
        "redis"
    }

    async fn health_check(&self) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(pong == "PONG")
    }

    async fn get(&self, collection: &str, key: &str) -> AppResult<Option<Document>> {
        let mut conn = self.conn.clone();
        let raw: HashMap<String, String> = redis::cmd("HGETALL")
            .arg(self.doc_key(collection, key))
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(Some(Document {
            key: key.to_string(),
            fields: decode_fields(raw),
        }))
    }

    async fn create(
        &self,
        collection: &str,
        key: &str,
        fields: Map<String, Value>,
    ) -> AppResult<bool> {
        let mut conn = self.conn.clone();
        let created: bool = redis::cmd("HSETNX")
            .arg(self.doc_key(collection, key))
            .arg(KEY_FIELD)
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        if !created {
            return Ok(false);
        }
        self.write_fields(collection, key, &fields).await?;
        Ok(true)
    }

    async fn merge(&self, collection: &str, key: &str, fields: Map<String, Value>) -> AppResult<()> {
        self.write_fields(collection, key, &fields).await
    }

    async fn find(&self, collection: &str, query: &DocumentQuery) -> AppResult<Vec<Document>> {
        let mut conn = self.conn.clone();
        let min = match &query.start_after {
            Some(after) => format!("({after}"),
            None => "-".to_string(),
        };

        let mut cmd = redis::cmd("ZRANGEBYLEX");
        cmd.arg(self.index_key(collection)).arg(min).arg("+");
        if query.filter.is_none() {
            if let Some(limit) = query.limit {
                cmd.arg("LIMIT").arg(0).arg(limit);
            }
        }
        let keys: Vec<String> = cmd.query_async(&mut conn).await.map_err(Self::map_err)?;

        let limit = query.limit.unwrap_or(usize::MAX);
        let mut docs = Vec::new();
        for key in keys {
            if docs.len() >= limit {
                break;
            }
            if let Some(doc) = self.get(collection, &key).await? {
                if query.matches(&doc) {
                    docs.push(doc);
                }
            }
        }
        Ok(docs)
    }

    async fn increment(
        &self,
        collection: &str,
        key: &str,
        field: &str,
        delta: i64,
    ) -> AppResult<i64> {
        let mut conn = self.conn.clone();
        let (value,): (i64,) = redis::pipe()
            .atomic()
            .cmd("HINCRBY")
            .arg(self.doc_key(collection, key))
            .arg(field)
            .arg(delta)
            .cmd("HSETNX")
            .arg(self.doc_key(collection, key))
            .arg(KEY_FIELD)
            .arg(key)
            .ignore()
            .cmd("ZADD")
            .arg(self.index_key(collection))
            .arg(0)
            .arg(key)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;
        Ok(value)
    }
}
