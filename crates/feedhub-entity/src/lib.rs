//! # feedhub-entity
//!
//! Domain models for FeedHub. A [`PackageManifest`] is what an archive says
//! about itself; a [`PackageRecord`] is what the feed knows about a stored
//! package (hash, size, timestamps, latest flags and download counters).

pub mod package;

pub use package::manifest::{Dependency, DependencyGroup, PackageManifest};
pub use package::record::PackageRecord;
