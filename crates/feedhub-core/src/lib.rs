//! # feedhub-core
//!
//! Core crate for FeedHub. Contains the configuration schemas, the
//! object/document store traits used by the cloud backend, time formatting
//! helpers, and the unified error system.
//!
//! This crate has **no** internal dependencies on other FeedHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod time;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
