//! Timestamp formatting for feed documents.

use chrono::{DateTime, Utc};

/// Format string for `Edm.DateTime` values.
pub const ZULU_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format a UTC timestamp as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_zulu(ts: &DateTime<Utc>) -> String {
    ts.format(ZULU_FORMAT).to_string()
}
