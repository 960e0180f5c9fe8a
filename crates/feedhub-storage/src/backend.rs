//! The storage backend contract shared by every implementation.

use async_trait::async_trait;
use bytes::Bytes;

use feedhub_auth::AccessLevel;
use feedhub_core::result::AppResult;
use feedhub_core::traits::object_store::StoredObject;
use feedhub_entity::PackageRecord;

/// Content type served for `.nupkg` archives.
pub const PACKAGE_CONTENT_TYPE: &str = "binary/octet-stream";

/// Result of [`StorageBackend::store_package`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome {
    /// The package was new and is now stored.
    Stored(PackageRecord),
    /// A package with the same ID and version was already stored; nothing changed.
    AlreadyExists,
}

impl StoreOutcome {
    pub fn already_existed(&self) -> bool {
        matches!(self, Self::AlreadyExists)
    }
}

/// Parameters of a feed listing.
#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    /// Case-insensitive ID restriction. `None` or `""` lists everything.
    pub id_filter: Option<String>,
    /// Continuation token from a previous page.
    pub cursor: Option<String>,
    /// Page size.
    pub limit: usize,
}

impl FeedQuery {
    /// The filter, if it actually restricts anything.
    pub fn filter(&self) -> Option<&str> {
        self.id_filter.as_deref().filter(|f| !f.is_empty())
    }
}

/// One page of a feed listing.
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    pub entries: Vec<PackageRecord>,
    /// Token for the following page, present when this page is full.
    pub next_cursor: Option<String>,
}

/// Package persistence and retrieval.
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend type identifier (`"local"` or `"cloud"`).
    fn backend_type(&self) -> &str;

    /// Check whether the backing storage is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store an uploaded archive unless its (ID, Version) is already present.
    async fn store_package(&self, archive: Bytes) -> AppResult<StoreOutcome>;

    /// Fetch a single record.
    async fn get_entry(&self, id: &str, version: &str) -> AppResult<PackageRecord>;

    /// List records in stable order, optionally restricted to one ID.
    async fn get_feed_entries(&self, query: &FeedQuery) -> AppResult<FeedPage>;

    /// Read a stored file by logical path `{id}/{version}/{member}`.
    ///
    /// When the exact path is missing, the final segment is retried in
    /// lower case before giving up.
    async fn get_file(&self, path: &str) -> AppResult<StoredObject>;

    /// Read a package archive and count the download.
    ///
    /// Counting never delays or fails the read.
    async fn get_package_file(&self, id: &str, version: &str) -> AppResult<StoredObject>;

    /// Resolve what a presented API key may do.
    async fn get_access_level(&self, key: &str) -> AppResult<AccessLevel>;

    /// Rebuild derived in-memory state and return the number of packages known.
    async fn refresh(&self) -> AppResult<usize> {
        Ok(0)
    }
}

/// Guess a content type for a stored file.
pub fn content_type_for(path: &str) -> String {
    if path.to_ascii_lowercase().ends_with(".nupkg") {
        return PACKAGE_CONTENT_TYPE.to_string();
    }
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Wrap file bytes with the content type guessed from `path`.
pub(crate) fn stored_bytes(data: Bytes, path: &str) -> StoredObject {
    StoredObject::new(data, content_type_for(path))
}
