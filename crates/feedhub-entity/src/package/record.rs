//! Stored package record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use super::manifest::PackageManifest;
use super::version;

/// Hash algorithm name advertised in the feed.
pub const HASH_ALGORITHM: &str = "SHA512";

/// Everything the feed knows about one stored (ID, Version).
///
/// The latest flags and both counters are derived state: backends fill them
/// in from their index or aggregate documents when a record is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    #[serde(flatten)]
    pub manifest: PackageManifest,
    /// Lowercase hex SHA-512 of the whole archive.
    pub content_hash: String,
    pub hash_algorithm: String,
    /// Archive length in bytes.
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub last_edited_at: DateTime<Utc>,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub is_latest_version: bool,
    #[serde(default)]
    pub is_absolute_latest_version: bool,
    /// Downloads across every version of this ID.
    #[serde(default)]
    pub download_count: u64,
    /// Downloads of this version only.
    #[serde(default)]
    pub version_download_count: u64,
}

impl PackageRecord {
    /// Build a record for an archive, hashing its bytes.
    ///
    /// All three timestamps are set to `timestamp`.
    pub fn from_archive(manifest: PackageManifest, archive: &[u8], timestamp: DateTime<Utc>) -> Self {
        Self {
            manifest,
            content_hash: hex::encode(Sha512::digest(archive)),
            hash_algorithm: HASH_ALGORITHM.to_string(),
            size_bytes: archive.len() as u64,
            created_at: timestamp,
            last_edited_at: timestamp,
            published_at: timestamp,
            is_latest_version: false,
            is_absolute_latest_version: false,
            download_count: 0,
            version_download_count: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.manifest.id
    }

    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    /// `{ID}.{Version}.nupkg`
    pub fn filename(&self) -> String {
        package_filename(self.id(), self.version())
    }

    /// `{ID}/{Version}/{Filename}`
    pub fn storage_key(&self) -> String {
        storage_key(self.id(), self.version(), &self.filename())
    }

    pub fn is_prerelease(&self) -> bool {
        version::is_prerelease(self.version())
    }

    /// Set both latest flags from the current latest version of this ID.
    pub fn mark_latest(&mut self, latest_version: Option<&str>) {
        let latest = latest_version == Some(self.version());
        self.is_latest_version = latest;
        self.is_absolute_latest_version = latest;
    }

    /// Whether this record's ID matches `id` ignoring ASCII case.
    pub fn id_matches(&self, id: &str) -> bool {
        self.manifest.id.eq_ignore_ascii_case(id)
    }
}

/// `{id}.{version}.nupkg`
pub fn package_filename(id: &str, version: &str) -> String {
    format!("{id}.{version}.nupkg")
}

/// `{id}/{version}/{file}`
pub fn storage_key(id: &str, version: &str, file: &str) -> String {
    format!("{id}/{version}/{file}")
}
