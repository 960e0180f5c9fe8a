//! In-memory package index for the local backend.

use std::collections::HashMap;

use feedhub_entity::PackageRecord;
use feedhub_entity::package::version::max_version;

#[derive(Debug, Clone)]
struct IndexEntry {
    filename: String,
    record: PackageRecord,
}

/// Records ordered by filename, plus the latest version per lower-cased ID.
///
/// Derived state: it is rebuilt from the package tree on every rescan.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    entries: Vec<IndexEntry>,
    latest: HashMap<String, String>,
}

impl PackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert at the filename-ordered position.
    ///
    /// Returns `false` when the (ID, Version) is already present; IDs compare
    /// case-insensitively because the tree stores them lower-cased.
    pub fn insert(&mut self, record: PackageRecord) -> bool {
        if self.contains(record.id(), record.version()) {
            return false;
        }
        let filename = record.filename();
        let pos = self
            .entries
            .partition_point(|e| e.filename.as_str() < filename.as_str());
        let id_key = record.id().to_lowercase();
        self.entries.insert(pos, IndexEntry { filename, record });
        self.recompute_latest(&id_key);
        true
    }

    pub fn contains(&self, id: &str, version: &str) -> bool {
        self.find(id, version).is_some()
    }

    /// A copy of the record with its latest flags set.
    pub fn get(&self, id: &str, version: &str) -> Option<PackageRecord> {
        self.find(id, version).map(|r| self.decorate(r))
    }

    /// Latest version known for an ID.
    pub fn latest_version(&self, id: &str) -> Option<&str> {
        self.latest.get(&id.to_lowercase()).map(String::as_str)
    }

    /// Up to `limit` records after the filename `after`, optionally for one ID.
    pub fn page(&self, id_filter: Option<&str>, after: Option<&str>, limit: usize) -> Vec<PackageRecord> {
        let start = match after {
            Some(after) => self
                .entries
                .partition_point(|e| e.filename.as_str() <= after),
            None => 0,
        };
        self.entries[start..]
            .iter()
            .filter(|e| id_filter.is_none_or(|id| e.record.id_matches(id)))
            .take(limit)
            .map(|e| self.decorate(&e.record))
            .collect()
    }

    fn find(&self, id: &str, version: &str) -> Option<&PackageRecord> {
        self.entries
            .iter()
            .map(|e| &e.record)
            .find(|r| r.id_matches(id) && r.version() == version)
    }

    fn decorate(&self, record: &PackageRecord) -> PackageRecord {
        let mut record = record.clone();
        let latest = self.latest_version(record.id()).map(str::to_string);
        record.mark_latest(latest.as_deref());
        record
    }

    fn recompute_latest(&mut self, id_key: &str) {
        let latest = max_version(
            self.entries
                .iter()
                .filter(|e| e.record.id().to_lowercase() == id_key)
                .map(|e| e.record.version()),
        )
        .map(str::to_string);
        match latest {
            Some(v) => {
                self.latest.insert(id_key.to_string(), v);
            }
            None => {
                self.latest.remove(id_key);
            }
        }
    }
}
