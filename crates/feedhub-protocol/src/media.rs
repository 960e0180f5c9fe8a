//! Content types for feed responses.

/// Feeds and single entries.
pub const ATOM_FEED: &str = "application/atom+xml;type=feed;charset=utf-8";

/// Service and metadata documents.
pub const APPLICATION_XML: &str = "application/xml;charset=utf-8";

/// Package archives.
pub const PACKAGE: &str = "binary/octet-stream";
