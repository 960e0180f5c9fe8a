//! Package archive reader.
//!
//! A package is a zip archive with a `.nuspec` manifest at its root. Reading
//! is a pure in-memory transform: nothing is written anywhere.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use bytes::Bytes;
use zip::ZipArchive;

use feedhub_core::error::{AppError, ErrorKind};
use feedhub_core::result::AppResult;
use feedhub_entity::PackageManifest;

/// Cap on the capacity reserved up front for one member.
const MAX_PREALLOCATION: u64 = 16 * 1024 * 1024;

/// Default ceiling on the decompressed size of a whole package.
pub const DEFAULT_MAX_EXTRACTED_BYTES: u64 = 1024 * 1024 * 1024;

/// A parsed package archive.
#[derive(Debug, Clone)]
pub struct PackageArchive {
    pub manifest: PackageManifest,
    /// Archive path of the manifest that was used.
    pub manifest_path: String,
    /// Every file member keyed by its path inside the archive.
    pub members: BTreeMap<String, Bytes>,
}

impl PackageArchive {
    /// Read an archive held in memory.
    ///
    /// When several `.nuspec` files sit at the root, the last one in archive
    /// order is used. Members may expand to at most `max_extracted` bytes in
    /// total; a larger archive is rejected as malformed.
    pub fn read(archive: &[u8], max_extracted: u64) -> AppResult<Self> {
        let mut zip = ZipArchive::new(Cursor::new(archive)).map_err(|e| {
            AppError::with_source(
                ErrorKind::MalformedArchive,
                format!("Package is not a readable zip archive: {e}"),
                e,
            )
        })?;

        let mut members = BTreeMap::new();
        let mut manifest_path = None;
        let mut remaining = max_extracted;

        for index in 0..zip.len() {
            let mut file = zip.by_index(index).map_err(|e| {
                AppError::with_source(
                    ErrorKind::MalformedArchive,
                    format!("Unreadable archive entry #{index}: {e}"),
                    e,
                )
            })?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            let capacity = file.size().min(remaining).min(MAX_PREALLOCATION);
            let mut buf = Vec::with_capacity(capacity as usize);
            file.by_ref()
                .take(remaining.saturating_add(1))
                .read_to_end(&mut buf)
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::MalformedArchive,
                        format!("Failed to decompress archive entry {name}: {e}"),
                        e,
                    )
                })?;
            let read = buf.len() as u64;
            if read > remaining {
                return Err(AppError::malformed_archive(format!(
                    "Package expands beyond {max_extracted} bytes"
                )));
            }
            remaining -= read;

            if is_root_manifest(&name) {
                manifest_path = Some(name.clone());
            }
            members.insert(name, Bytes::from(buf));
        }

        let manifest_path = manifest_path
            .ok_or_else(|| AppError::manifest_missing("No .nuspec manifest at archive root"))?;
        let raw = members
            .get(&manifest_path)
            .ok_or_else(|| AppError::manifest_missing("No .nuspec manifest at archive root"))?;
        let xml = std::str::from_utf8(raw).map_err(|e| {
            AppError::with_source(
                ErrorKind::MalformedArchive,
                format!("Manifest {manifest_path} is not UTF-8"),
                e,
            )
        })?;
        let manifest = PackageManifest::from_nuspec(xml.trim_start_matches('\u{feff}'))?;

        Ok(Self {
            manifest,
            manifest_path,
            members,
        })
    }

    /// Read an archive on the blocking pool.
    pub async fn read_async(archive: Bytes, max_extracted: u64) -> AppResult<Self> {
        tokio::task::spawn_blocking(move || Self::read(&archive, max_extracted))
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Archive reader task failed", e)
            })?
    }
}

fn is_root_manifest(name: &str) -> bool {
    !name.contains('/') && !name.contains('\\') && name.to_ascii_lowercase().ends_with(".nuspec")
}
