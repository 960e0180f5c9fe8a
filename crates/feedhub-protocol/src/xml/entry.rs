//! Atom entry describing one package version.

use feedhub_core::result::AppResult;
use feedhub_core::time::format_zulu;
use feedhub_entity::PackageRecord;

use super::{
    NS_ATOM, NS_DATA, NS_METADATA, PLACEHOLDER_BASE_URL, XmlWriter, close, compat, leaf,
    new_writer, open,
};

const ENTITY_TYPE: &str = "MyGet.V2FeedPackage";
const SCHEME: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/scheme";
const REL_SCREENSHOTS: &str =
    "http://schemas.microsoft.com/ado/2007/08/dataservices/related/Screenshots";

/// A single package entry.
///
/// Standalone entries carry their own `xml:base` and namespace declarations;
/// entries nested in a feed inherit them from the `<feed>` element.
#[derive(Debug, Clone, Copy)]
pub struct EntryDocument<'a> {
    record: &'a PackageRecord,
}

impl<'a> EntryDocument<'a> {
    pub fn new(record: &'a PackageRecord) -> Self {
        Self { record }
    }

    /// Serialize as a top-level document.
    pub fn to_bytes(&self, base_url: &str) -> AppResult<Vec<u8>> {
        let mut w = new_writer();
        self.write(&mut w, true)?;
        Ok(compat::finish(w.into_inner(), base_url))
    }

    pub(crate) fn write(&self, w: &mut XmlWriter, standalone: bool) -> AppResult<()> {
        let r = self.record;
        let key = format!("Packages(Id='{}',Version='{}')", r.id(), r.version());
        let entry_id = format!("{PLACEHOLDER_BASE_URL}{key}");
        let screenshots = format!("{key}/Screenshots");
        let media = format!("{key}/$value");
        let content_src = format!("{PLACEHOLDER_BASE_URL}nupkg/{}/{}", r.id(), r.version());

        if standalone {
            open(
                w,
                "entry",
                &[
                    ("xml:base", PLACEHOLDER_BASE_URL),
                    ("xmlns", NS_ATOM),
                    ("xmlns:d", NS_DATA),
                    ("xmlns:m", NS_METADATA),
                ],
            )?;
        } else {
            open(w, "entry", &[])?;
        }

        leaf(w, "id", &[], &entry_id)?;
        leaf(w, "category", &[("term", ENTITY_TYPE), ("scheme", SCHEME)], "")?;
        leaf(
            w,
            "link",
            &[("rel", "edit"), ("title", "V2FeedPackage"), ("href", &key)],
            "",
        )?;
        leaf(
            w,
            "link",
            &[
                ("rel", REL_SCREENSHOTS),
                ("type", "application/atom+xml;type=feed"),
                ("title", "Screenshots"),
                ("href", &screenshots),
            ],
            "",
        )?;
        leaf(
            w,
            "link",
            &[("rel", "edit-media"), ("title", "V2FeedPackage"), ("href", &media)],
            "",
        )?;
        leaf(w, "title", &[("type", "text")], r.id())?;
        leaf(
            w,
            "summary",
            &[("type", "text")],
            r.manifest.summary.as_deref().unwrap_or(""),
        )?;
        leaf(w, "updated", &[], &format_zulu(&r.last_edited_at))?;
        open(w, "author", &[])?;
        leaf(w, "name", &[], r.manifest.authors.as_deref().unwrap_or(""))?;
        close(w, "author")?;
        leaf(
            w,
            "content",
            &[("type", "binary/octet-stream"), ("src", &content_src)],
            "",
        )?;

        self.write_properties(w)?;
        close(w, "entry")
    }

    fn write_properties(&self, w: &mut XmlWriter) -> AppResult<()> {
        let r = self.record;
        let m = &r.manifest;

        open(w, "m:properties", &[])?;
        text(w, "d:Id", r.id())?;
        text(w, "d:Version", r.version())?;
        text(w, "d:NormalizedVersion", r.version())?;
        nullable(w, "d:Copyright", m.copyright.as_deref())?;
        typed(w, "d:Created", "Edm.DateTime", &format_zulu(&r.created_at))?;
        text(w, "d:Dependencies", &m.dependencies_string())?;
        text(w, "d:Description", m.description.as_deref().unwrap_or(""))?;
        typed(w, "d:DownloadCount", "Edm.Int32", &r.download_count.to_string())?;
        text(w, "d:GalleryDetailsUrl", m.project_url.as_deref().unwrap_or(""))?;
        text(w, "d:IconUrl", m.icon_url.as_deref().unwrap_or(""))?;
        typed(w, "d:IsLatestVersion", "Edm.Boolean", bool_str(r.is_latest_version))?;
        typed(
            w,
            "d:IsAbsoluteLatestVersion",
            "Edm.Boolean",
            bool_str(r.is_absolute_latest_version),
        )?;
        typed(w, "d:LastEdited", "Edm.DateTime", &format_zulu(&r.last_edited_at))?;
        typed(w, "d:Published", "Edm.DateTime", &format_zulu(&r.published_at))?;
        nullable(w, "d:LicenseUrl", m.license_url.as_deref())?;
        nullable(w, "d:LicenseNames", m.license_expression.as_deref())?;
        nullable(w, "d:LicenseReportUrl", None)?;
        text(w, "d:PackageHash", &r.content_hash)?;
        text(w, "d:PackageHashAlgorithm", &r.hash_algorithm)?;
        typed(w, "d:PackageSize", "Edm.Int64", &r.size_bytes.to_string())?;
        text(w, "d:ProjectUrl", m.project_url.as_deref().unwrap_or(""))?;
        nullable(w, "d:ReleaseNotes", m.release_notes.as_deref())?;
        text(w, "d:ReportAbuseUrl", "")?;
        typed(
            w,
            "d:RequireLicenseAcceptance",
            "Edm.Boolean",
            bool_str(m.require_license_acceptance),
        )?;
        text(w, "d:Tags", m.tags.as_deref().unwrap_or(""))?;
        text(w, "d:Title", m.display_title())?;
        typed(
            w,
            "d:VersionDownloadCount",
            "Edm.Int32",
            &r.version_download_count.to_string(),
        )?;
        typed(w, "d:IsPrerelease", "Edm.Boolean", bool_str(r.is_prerelease()))?;
        nullable(w, "d:MinClientVersion", m.min_client_version.as_deref())?;
        text(w, "d:Language", m.language.as_deref().unwrap_or(""))?;
        close(w, "m:properties")
    }
}

fn text(w: &mut XmlWriter, name: &str, value: &str) -> AppResult<()> {
    leaf(w, name, &[], value)
}

fn typed(w: &mut XmlWriter, name: &str, edm_type: &str, value: &str) -> AppResult<()> {
    leaf(w, name, &[("m:type", edm_type)], value)
}

/// Absent values get `m:null="true"` instead of an empty element.
fn nullable(w: &mut XmlWriter, name: &str, value: Option<&str>) -> AppResult<()> {
    match value {
        Some(v) => leaf(w, name, &[], v),
        None => leaf(w, name, &[("m:null", "true")], ""),
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
