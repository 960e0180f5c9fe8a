//! AtomPub service document listing the feed's collections.

use feedhub_core::result::AppResult;

use super::{NS_APP, NS_ATOM, PLACEHOLDER_BASE_URL, close, compat, leaf, new_writer, open};

const COLLECTIONS: [&str; 2] = ["Packages", "Screenshots"];

/// The document served at the feed root.
#[derive(Debug, Clone)]
pub struct ServiceDocument<'a> {
    base_url: &'a str,
}

impl<'a> ServiceDocument<'a> {
    pub fn new(base_url: &'a str) -> Self {
        Self { base_url }
    }

    pub fn to_bytes(&self) -> AppResult<Vec<u8>> {
        let mut w = new_writer();
        open(
            &mut w,
            "service",
            &[
                ("xml:base", PLACEHOLDER_BASE_URL),
                ("xmlns", NS_APP),
                ("xmlns:atom", NS_ATOM),
            ],
        )?;
        open(&mut w, "workspace", &[])?;
        leaf(&mut w, "atom:title", &[], "Default")?;
        for name in COLLECTIONS {
            open(&mut w, "collection", &[("href", name)])?;
            leaf(&mut w, "atom:title", &[], name)?;
            close(&mut w, "collection")?;
        }
        close(&mut w, "workspace")?;
        close(&mut w, "service")?;

        Ok(compat::finish(w.into_inner(), self.base_url))
    }
}
