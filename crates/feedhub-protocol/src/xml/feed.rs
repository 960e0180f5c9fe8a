//! Atom feed wrapping a page of package entries.

use chrono::{DateTime, Utc};

use feedhub_core::result::AppResult;
use feedhub_core::time::format_zulu;
use feedhub_entity::PackageRecord;

use super::entry::EntryDocument;
use super::{NS_ATOM, NS_DATA, NS_METADATA, PLACEHOLDER_BASE_URL, close, compat, leaf, new_writer, open};

/// A feed of zero or more entries.
#[derive(Debug, Clone)]
pub struct FeedDocument<'a> {
    title: &'a str,
    base_url: &'a str,
    updated: DateTime<Utc>,
    entries: &'a [PackageRecord],
    next_href: Option<String>,
}

impl<'a> FeedDocument<'a> {
    pub fn new(title: &'a str, base_url: &'a str, entries: &'a [PackageRecord]) -> Self {
        Self {
            title,
            base_url,
            updated: Utc::now(),
            entries,
            next_href: None,
        }
    }

    /// Override the feed-level `<updated>` timestamp.
    pub fn with_updated(mut self, updated: DateTime<Utc>) -> Self {
        self.updated = updated;
        self
    }

    /// Add a `rel="next"` link, relative to the base URL.
    pub fn with_next(mut self, href: Option<String>) -> Self {
        self.next_href = href;
        self
    }

    pub fn to_bytes(&self) -> AppResult<Vec<u8>> {
        let mut w = new_writer();
        let feed_id = format!("{PLACEHOLDER_BASE_URL}{}", self.title);

        open(
            &mut w,
            "feed",
            &[
                ("xml:base", PLACEHOLDER_BASE_URL),
                ("xmlns", NS_ATOM),
                ("xmlns:d", NS_DATA),
                ("xmlns:m", NS_METADATA),
            ],
        )?;
        leaf(&mut w, "id", &[], &feed_id)?;
        leaf(&mut w, "title", &[("type", "text")], self.title)?;
        leaf(&mut w, "updated", &[], &format_zulu(&self.updated))?;
        leaf(
            &mut w,
            "link",
            &[("rel", "self"), ("title", self.title), ("href", self.title)],
            "",
        )?;

        for record in self.entries {
            EntryDocument::new(record).write(&mut w, false)?;
        }

        if let Some(href) = &self.next_href {
            leaf(&mut w, "link", &[("rel", "next"), ("href", href)], "")?;
        }
        close(&mut w, "feed")?;

        Ok(compat::finish(w.into_inner(), self.base_url))
    }
}
