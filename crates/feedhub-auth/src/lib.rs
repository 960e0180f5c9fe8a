//! # feedhub-auth
//!
//! API key tiering for FeedHub.
//!
//! ## Modules
//!
//! - `level`: the three access levels and the checks handlers perform
//! - `policy`: key sets loaded from configuration and the tier resolution rule

pub mod level;
pub mod policy;

pub use level::AccessLevel;
pub use policy::{AccessPolicy, AccessResolver, PolicyMode, resolve_level};
