//! # feedhub-api
//!
//! HTTP API layer for FeedHub built on Axum.
//!
//! Serves the V2 feed (service document, metadata, package listings and
//! entries), package downloads and extracted files, and accepts pushes.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
