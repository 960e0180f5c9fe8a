//! # feedhub-protocol
//!
//! The wire side of the V2 package feed.
//!
//! ## Modules
//!
//! - `query`: parenthesised function parameters and `$filter` parsing
//! - `xml`: service, feed and entry documents plus the compatibility
//!   repairs real clients depend on
//! - `media`: content types used by feed responses

pub mod media;
pub mod query;
pub mod xml;

pub use query::{PackageParams, function_segment, parse_filter, parse_function_params, parse_quoted_value};
pub use xml::{EntryDocument, FeedDocument, METADATA_DOCUMENT, ServiceDocument};
