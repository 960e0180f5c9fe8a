//! # feedhub-storage
//!
//! Package storage for FeedHub. Two [`StorageBackend`] implementations share
//! one contract: a filesystem tree with an in-memory index, and a cloud
//! layout over an [`ObjectStore`](feedhub_core::traits::object_store::ObjectStore)
//! plus a [`DocumentStore`](feedhub_core::traits::document_store::DocumentStore).

pub mod archive;
pub mod backend;
pub mod cloud;
pub mod document;
pub mod local;
pub mod locks;
pub mod manager;
pub mod object;

pub use archive::PackageArchive;
pub use backend::{FeedPage, FeedQuery, StorageBackend, StoreOutcome};
pub use cloud::{CloudStorageBackend, KeyRegistry};
pub use local::LocalStorageBackend;
pub use manager::build_backend;
