//! Local filesystem backend.
//!
//! Layout: `root/{id}/{version}/{id}.{version}.nupkg` with the archive's
//! members extracted alongside. The `{id}` segments are lower-cased on disk.

pub mod index;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use feedhub_auth::{AccessLevel, AccessResolver};
use feedhub_core::error::{AppError, ErrorKind};
use feedhub_core::result::AppResult;
use feedhub_core::traits::object_store::StoredObject;
use feedhub_entity::PackageRecord;
use feedhub_entity::package::manifest::{is_valid_id, is_valid_version};

use crate::archive::{DEFAULT_MAX_EXTRACTED_BYTES, PackageArchive};
use crate::backend::{
    FeedPage, FeedQuery, PACKAGE_CONTENT_TYPE, StorageBackend, StoreOutcome, stored_bytes,
};
use crate::locks::KeyedLocks;

use self::index::PackageIndex;

/// Download counters kept in memory, keyed by lower-cased ID.
///
/// They live outside the index so a rescan does not reset them.
#[derive(Debug, Default)]
struct DownloadCounters {
    per_id: DashMap<String, AtomicU64>,
    per_version: DashMap<(String, String), AtomicU64>,
}

impl DownloadCounters {
    fn record(&self, id: &str, version: &str) {
        let id = id.to_lowercase();
        self.per_version
            .entry((id.clone(), version.to_string()))
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
        self.per_id
            .entry(id)
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    fn apply(&self, record: &mut PackageRecord) {
        let id = record.id().to_lowercase();
        record.download_count = self
            .per_id
            .get(&id)
            .map_or(0, |c| c.load(Ordering::Relaxed));
        record.version_download_count = self
            .per_version
            .get(&(id, record.version().to_string()))
            .map_or(0, |c| c.load(Ordering::Relaxed));
    }
}

/// Filesystem-backed package storage with an in-memory index.
#[derive(Debug)]
pub struct LocalStorageBackend {
    /// Root of the package tree.
    root: PathBuf,
    /// Current index, swapped wholesale on rescan.
    index: RwLock<Arc<PackageIndex>>,
    /// Held exclusively by a rescan and shared by stores.
    scan_gate: RwLock<()>,
    /// Per-ID store serialization.
    locks: KeyedLocks,
    counters: DownloadCounters,
    access: Arc<dyn AccessResolver>,
    /// Ceiling on the decompressed size of one package.
    max_extracted: u64,
}

impl LocalStorageBackend {
    /// Open the tree at `root_path`, creating it if needed, and index it.
    pub async fn new(root_path: &str, access: Arc<dyn AccessResolver>) -> AppResult<Self> {
        Self::open(root_path, access, DEFAULT_MAX_EXTRACTED_BYTES).await
    }

    /// Like [`new`](Self::new), with a ceiling on the decompressed size of
    /// each package, applied to the initial scan as well.
    pub async fn open(
        root_path: &str,
        access: Arc<dyn AccessResolver>,
        max_extracted: u64,
    ) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::BackendUnavailable,
                format!("Failed to create package root: {}", root.display()),
                e,
            )
        })?;

        let backend = Self {
            root,
            index: RwLock::new(Arc::new(PackageIndex::new())),
            scan_gate: RwLock::new(()),
            locks: KeyedLocks::new(),
            counters: DownloadCounters::default(),
            access,
            max_extracted,
        };
        backend.refresh().await?;
        Ok(backend)
    }

    fn version_dir(&self, id: &str, version: &str) -> PathBuf {
        self.root.join(id.to_lowercase()).join(version)
    }

    /// Callers pass an `id` and `version` already checked by [`is_valid_id`]
    /// and [`is_valid_version`].
    fn nupkg_path(&self, id: &str, version: &str) -> PathBuf {
        let lower = id.to_lowercase();
        self.version_dir(id, version)
            .join(format!("{lower}.{version}.nupkg"))
    }

    async fn snapshot(&self) -> Arc<PackageIndex> {
        Arc::clone(&*self.index.read().await)
    }

    /// Walk `root/{id}/{version}` and build a fresh index.
    async fn scan(&self) -> AppResult<PackageIndex> {
        let mut index = PackageIndex::new();
        let mut id_dirs = fs::read_dir(&self.root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::BackendUnavailable,
                format!("Failed to read package root: {}", self.root.display()),
                e,
            )
        })?;

        while let Some(id_dir) = next_entry(&mut id_dirs, &self.root).await {
            if !is_dir_entry(&id_dir).await {
                continue;
            }
            let id_name = id_dir.file_name().to_string_lossy().to_string();
            let mut version_dirs = match fs::read_dir(id_dir.path()).await {
                Ok(dirs) => dirs,
                Err(e) => {
                    warn!(id = %id_name, error = %e, "Skipping unreadable package directory");
                    continue;
                }
            };

            while let Some(version_dir) = next_entry(&mut version_dirs, &id_dir.path()).await {
                if !is_dir_entry(&version_dir).await {
                    continue;
                }
                let version_name = version_dir.file_name().to_string_lossy().to_string();
                let nupkg = version_dir
                    .path()
                    .join(format!("{id_name}.{version_name}.nupkg"));

                match load_record(&nupkg, self.max_extracted).await {
                    Ok(record) => {
                        index.insert(record);
                    }
                    Err(e) => {
                        warn!(path = %nupkg.display(), error = %e, "Skipping package that failed to load");
                    }
                }
            }
        }

        Ok(index)
    }
}

/// Next entry of a directory listing; a read error ends that listing only.
async fn next_entry(dir: &mut fs::ReadDir, parent: &Path) -> Option<fs::DirEntry> {
    match dir.next_entry().await {
        Ok(entry) => entry,
        Err(e) => {
            warn!(dir = %parent.display(), error = %e, "Stopped reading directory");
            None
        }
    }
}

/// Directories, and symlinks that resolve to one. Entries that cannot be
/// inspected are skipped.
async fn is_dir_entry(entry: &fs::DirEntry) -> bool {
    match entry.file_type().await {
        Ok(kind) if kind.is_dir() => true,
        Ok(kind) if kind.is_symlink() => match fs::metadata(entry.path()).await {
            Ok(meta) => meta.is_dir(),
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Skipping unreadable link");
                false
            }
        },
        Ok(_) => false,
        Err(e) => {
            warn!(path = %entry.path().display(), error = %e, "Skipping unreadable entry");
            false
        }
    }
}

async fn load_record(nupkg: &Path, max_extracted: u64) -> AppResult<PackageRecord> {
    let data = Bytes::from(fs::read(nupkg).await?);
    let modified: DateTime<Utc> = fs::metadata(nupkg)
        .await?
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    let archive = PackageArchive::read_async(data.clone(), max_extracted).await?;
    Ok(PackageRecord::from_archive(archive.manifest, &data, modified))
}

/// Only plain relative components; anything else could escape the version directory.
fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let path = Path::new(name);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            _ => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

async fn write_file(path: &Path, data: &[u8]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create directory: {}", parent.display()),
                e,
            )
        })?;
    }
    fs::write(path, data).await.map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to write file: {}", path.display()),
            e,
        )
    })?;
    debug!(path = %path.display(), bytes = data.len(), "Wrote file");
    Ok(())
}

async fn read_if_exists(path: &Path) -> AppResult<Option<Bytes>> {
    match fs::read(path).await {
        Ok(data) => Ok(Some(Bytes::from(data))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to read file: {}", path.display()),
            e,
        )),
    }
}

#[async_trait]
impl StorageBackend for LocalStorageBackend {
    fn backend_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root).await.is_ok_and(|m| m.is_dir()))
    }

    async fn store_package(&self, archive: Bytes) -> AppResult<StoreOutcome> {
        let package = PackageArchive::read_async(archive.clone(), self.max_extracted).await?;
        let id = package.manifest.id.clone();
        let version = package.manifest.version.clone();

        let _lock = self.locks.lock(&id.to_lowercase()).await;
        let _gate = self.scan_gate.read().await;

        let nupkg = self.nupkg_path(&id, &version);
        if self.snapshot().await.contains(&id, &version) || fs::try_exists(&nupkg).await? {
            return Ok(StoreOutcome::AlreadyExists);
        }

        let dir = self.version_dir(&id, &version);
        for (name, data) in &package.members {
            match safe_relative_path(name) {
                Some(relative) => write_file(&dir.join(relative), data).await?,
                None => warn!(member = %name, "Skipping archive member with unsafe path"),
            }
        }
        write_file(&nupkg, &archive).await?;

        let record = PackageRecord::from_archive(package.manifest, &archive, Utc::now());
        {
            let mut current = self.index.write().await;
            Arc::make_mut(&mut *current).insert(record.clone());
        }

        info!(id = %id, version = %version, bytes = archive.len(), "Stored package");
        Ok(StoreOutcome::Stored(record))
    }

    async fn get_entry(&self, id: &str, version: &str) -> AppResult<PackageRecord> {
        let mut record = self
            .snapshot()
            .await
            .get(id, version)
            .ok_or_else(|| AppError::not_found(format!("Package not found: {id} {version}")))?;
        self.counters.apply(&mut record);
        Ok(record)
    }

    async fn get_feed_entries(&self, query: &FeedQuery) -> AppResult<FeedPage> {
        let index = self.snapshot().await;
        let mut entries = index.page(query.filter(), query.cursor.as_deref(), query.limit);
        for record in &mut entries {
            self.counters.apply(record);
        }
        let next_cursor = if query.limit > 0 && entries.len() == query.limit {
            entries.last().map(PackageRecord::filename)
        } else {
            None
        };
        Ok(FeedPage {
            entries,
            next_cursor,
        })
    }

    async fn get_file(&self, path: &str) -> AppResult<StoredObject> {
        let not_found = || AppError::not_found(format!("File not found: {path}"));

        let mut segments: Vec<String> = path
            .trim_start_matches('/')
            .split('/')
            .map(str::to_string)
            .collect();
        if segments
            .iter()
            .any(|s| s.is_empty() || s == "." || s == ".." || s.contains('\\'))
        {
            return Err(not_found());
        }
        segments[0] = segments[0].to_lowercase();

        let exact = self.root.join(segments.join("/"));
        if let Some(data) = read_if_exists(&exact).await? {
            return Ok(stored_bytes(data, path));
        }

        if let Some(last) = segments.last_mut() {
            let lowered = last.to_lowercase();
            if lowered != *last {
                *last = lowered;
                let retry = self.root.join(segments.join("/"));
                if let Some(data) = read_if_exists(&retry).await? {
                    return Ok(stored_bytes(data, path));
                }
            }
        }

        Err(not_found())
    }

    async fn get_package_file(&self, id: &str, version: &str) -> AppResult<StoredObject> {
        if !is_valid_id(id) || !is_valid_version(version) {
            return Err(AppError::not_found(format!("Package not found: {id} {version}")));
        }
        let data = read_if_exists(&self.nupkg_path(id, version))
            .await?
            .ok_or_else(|| AppError::not_found(format!("Package not found: {id} {version}")))?;
        self.counters.record(id, version);
        Ok(StoredObject::new(data, PACKAGE_CONTENT_TYPE))
    }

    async fn get_access_level(&self, key: &str) -> AppResult<AccessLevel> {
        self.access.access_level(key).await
    }

    async fn refresh(&self) -> AppResult<usize> {
        let _gate = self.scan_gate.write().await;
        let index = self.scan().await?;
        let count = index.len();
        *self.index.write().await = Arc::new(index);
        info!(count, root = %self.root.display(), "Rebuilt package index");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedhub_auth::AccessPolicy;

    use crate::archive::tests::{build_zip, nuspec, package};

    async fn backend(root: &Path) -> LocalStorageBackend {
        let access = Arc::new(AccessPolicy::default());
        LocalStorageBackend::new(root.to_str().unwrap(), access)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_store_twice_reports_already_exists() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(dir.path()).await;
        let data = Bytes::from(package("Sample.Plugin", "1.0.0"));

        let first = backend.store_package(data.clone()).await.unwrap();
        assert!(!first.already_existed());
        let second = backend.store_package(data).await.unwrap();
        assert!(second.already_existed());

        let nupkg = dir
            .path()
            .join("sample.plugin/1.0.0/sample.plugin.1.0.0.nupkg");
        assert!(nupkg.exists());
        assert!(dir.path().join("sample.plugin/1.0.0/content/ReadMe.TXT").exists());
    }

    #[tokio::test]
    async fn test_concurrent_stores_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(backend(dir.path()).await);
        let data = Bytes::from(package("Race", "1.0.0"));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let backend = Arc::clone(&backend);
            let data = data.clone();
            handles.push(tokio::spawn(async move { backend.store_package(data).await }));
        }
        let mut stored = 0;
        for handle in handles {
            if !handle.await.unwrap().unwrap().already_existed() {
                stored += 1;
            }
        }
        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn test_refresh_picks_up_existing_tree_and_skips_broken_packages() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = backend(dir.path()).await;
            backend
                .store_package(Bytes::from(package("Good", "1.0.0")))
                .await
                .unwrap();
        }
        let broken = dir.path().join("broken/1.0.0");
        std::fs::create_dir_all(&broken).unwrap();
        std::fs::write(broken.join("broken.1.0.0.nupkg"), b"not a zip").unwrap();
        std::fs::create_dir_all(dir.path().join("empty/1.0.0")).unwrap();

        let backend = backend(dir.path()).await;
        let page = backend
            .get_feed_entries(&FeedQuery {
                limit: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].id(), "Good");
        assert_eq!(backend.refresh().await.unwrap(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_refresh_skips_dangling_links_and_stray_files() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = backend(dir.path()).await;
            backend
                .store_package(Bytes::from(package("Good", "1.0.0")))
                .await
                .unwrap();
        }
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("gone"),
            dir.path().join("good/2.0.0"),
        )
        .unwrap();
        std::fs::write(dir.path().join("stray.txt"), b"x").unwrap();

        let backend = backend(dir.path()).await;
        assert_eq!(backend.refresh().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_manifest_id_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let backend = backend(&root).await;
        let spec = nuspec("../escaped", "1.0.0");
        let data = build_zip(&[
            ("evil.nuspec", spec.as_bytes()),
            ("content/ReadMe.TXT", b"outside"),
        ]);

        let err = backend.store_package(Bytes::from(data)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedArchive);
        assert!(!dir.path().join("escaped").exists());
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_package_file_rejects_path_like_id() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let backend = backend(&root).await;
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(outside.join("1.0.0")).unwrap();
        std::fs::write(outside.join("outside.1.0.0.nupkg"), b"secret").unwrap();

        let err = backend
            .get_package_file("../outside", "1.0.0/..")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        let err = backend
            .get_package_file("Good", "../../outside/1.0.0")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_oversized_package_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let access = Arc::new(AccessPolicy::default());
        let backend = LocalStorageBackend::open(dir.path().to_str().unwrap(), access, 1024)
            .await
            .unwrap();
        let spec = nuspec("Big", "1.0.0");
        let zeros = vec![0u8; 4096];
        let data = build_zip(&[
            ("Big.nuspec", spec.as_bytes()),
            ("content/zeros.bin", &zeros),
        ]);

        let err = backend.store_package(Bytes::from(data)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedArchive);
        assert!(!dir.path().join("big").exists());
    }

    #[tokio::test]
    async fn test_latest_and_filter() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(dir.path()).await;
        for v in ["1.0.0", "1.1.0"] {
            backend
                .store_package(Bytes::from(package("Sample.Plugin", v)))
                .await
                .unwrap();
        }
        backend
            .store_package(Bytes::from(package("Other", "9.0.0")))
            .await
            .unwrap();

        let page = backend
            .get_feed_entries(&FeedQuery {
                id_filter: Some("sample.plugin".to_string()),
                cursor: None,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(page.entries.len(), 2);
        assert!(page.next_cursor.is_none());
        let latest: Vec<&str> = page
            .entries
            .iter()
            .filter(|r| r.is_latest_version)
            .map(|r| r.version())
            .collect();
        assert_eq!(latest, vec!["1.1.0"]);
    }

    #[tokio::test]
    async fn test_get_file_retries_lowercase_name() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(dir.path()).await;
        let spec = nuspec("Docs", "1.0.0");
        let data = build_zip(&[
            ("Docs.nuspec", spec.as_bytes()),
            ("content/readme.md", b"# docs"),
        ]);
        backend.store_package(Bytes::from(data)).await.unwrap();

        let file = backend.get_file("Docs/1.0.0/content/README.md").await.unwrap();
        assert_eq!(file.data, Bytes::from_static(b"# docs"));

        let err = backend.get_file("Docs/1.0.0/content/missing.md").await.unwrap_err();
        assert!(err.is_not_found());
        let err = backend.get_file("Docs/../../etc/passwd").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_download_counts() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(dir.path()).await;
        for v in ["1.0.0", "1.1.0"] {
            backend
                .store_package(Bytes::from(package("Sample.Plugin", v)))
                .await
                .unwrap();
        }

        let file = backend
            .get_package_file("Sample.Plugin", "1.0.0")
            .await
            .unwrap();
        assert_eq!(file.content_type, "binary/octet-stream");

        let old = backend.get_entry("Sample.Plugin", "1.0.0").await.unwrap();
        assert_eq!(old.version_download_count, 1);
        assert_eq!(old.download_count, 1);
        let new = backend.get_entry("Sample.Plugin", "1.1.0").await.unwrap();
        assert_eq!(new.version_download_count, 0);
        assert_eq!(new.download_count, 1);

        let err = backend.get_package_file("Sample.Plugin", "3.0.0").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
