//! XML documents of the V2 feed.
//!
//! Documents are written with `quick_xml::Writer` into a buffer, then passed
//! through [`compat::finish`], which applies the textual repairs that
//! package-manager clients rely on and swaps in the real base URL.

pub mod compat;
mod entry;
mod feed;
mod metadata;
mod service;

pub use entry::EntryDocument;
pub use feed::FeedDocument;
pub use metadata::METADATA_DOCUMENT;
pub use service::ServiceDocument;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use feedhub_core::error::{AppError, ErrorKind};
use feedhub_core::result::AppResult;

/// Sentinel base URL used while building documents.
pub const PLACEHOLDER_BASE_URL: &str = "http://hosturl/";

pub(crate) const NS_ATOM: &str = "http://www.w3.org/2005/Atom";
pub(crate) const NS_APP: &str = "http://www.w3.org/2007/app";
pub(crate) const NS_DATA: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices";
pub(crate) const NS_METADATA: &str =
    "http://schemas.microsoft.com/ado/2007/08/dataservices/metadata";

pub(crate) type XmlWriter = Writer<Vec<u8>>;

pub(crate) fn new_writer() -> XmlWriter {
    Writer::new_with_indent(Vec::new(), b' ', 4)
}

fn xml_err(e: impl std::error::Error + Send + Sync + 'static) -> AppError {
    AppError::with_source(ErrorKind::Serialization, format!("XML write failed: {e}"), e)
}

pub(crate) fn open(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> AppResult<()> {
    let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
    w.write_event(Event::Start(start)).map_err(xml_err)
}

pub(crate) fn close(w: &mut XmlWriter, name: &str) -> AppResult<()> {
    w.write_event(Event::End(BytesEnd::new(name))).map_err(xml_err)
}

/// Write `<name attrs>text</name>`, always as an open/close pair.
pub(crate) fn leaf(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)], text: &str) -> AppResult<()> {
    open(w, name, attrs)?;
    w.write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_err)?;
    close(w, name)
}
