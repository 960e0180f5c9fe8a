//! Package manifest model, parsed from an archive's `.nuspec` file.

use serde::{Deserialize, Serialize};

use feedhub_core::error::{AppError, ErrorKind};
use feedhub_core::result::AppResult;

/// Metadata a package declares about itself.
///
/// Optional text fields are `None` when the manifest omits them or leaves
/// them blank, so the feed can tell "null" apart from a real value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Case-sensitive canonical package identifier.
    pub id: String,
    /// Version string as written in the manifest.
    pub version: String,
    pub title: Option<String>,
    pub authors: Option<String>,
    pub owners: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub tags: Option<String>,
    pub project_url: Option<String>,
    pub icon_url: Option<String>,
    pub license_url: Option<String>,
    /// SPDX expression from `<license type="expression">`.
    pub license_expression: Option<String>,
    pub copyright: Option<String>,
    pub release_notes: Option<String>,
    #[serde(default)]
    pub require_license_acceptance: bool,
    pub min_client_version: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub dependency_groups: Vec<DependencyGroup>,
}

/// Dependencies that apply to one target framework (or to all, when `None`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGroup {
    pub target_framework: Option<String>,
    pub dependencies: Vec<Dependency>,
}

/// A single dependency on another package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    /// Version range, e.g. `[1.0,2.0)`.
    pub version: Option<String>,
}

impl PackageManifest {
    /// Parse a `.nuspec` document.
    pub fn from_nuspec(xml: &str) -> AppResult<Self> {
        let doc: NuspecXml = quick_xml::de::from_str(xml).map_err(|e| {
            AppError::with_source(
                ErrorKind::MalformedArchive,
                format!("Invalid package manifest: {e}"),
                e,
            )
        })?;
        let meta = doc.metadata;

        let id = non_empty(meta.id)
            .ok_or_else(|| AppError::malformed_archive("Package manifest has no id"))?;
        let version = non_empty(meta.version)
            .ok_or_else(|| AppError::malformed_archive("Package manifest has no version"))?;
        if !is_valid_id(&id) {
            return Err(AppError::malformed_archive(format!(
                "Invalid package id: {id:?}"
            )));
        }
        if !is_valid_version(&version) {
            return Err(AppError::malformed_archive(format!(
                "Invalid package version: {version:?}"
            )));
        }

        let license_expression = meta.license.and_then(|l| match l.kind.as_deref() {
            Some("expression") => non_empty(l.value),
            _ => None,
        });

        let mut dependency_groups = Vec::new();
        if let Some(deps) = meta.dependencies {
            if !deps.dependency.is_empty() {
                dependency_groups.push(DependencyGroup {
                    target_framework: None,
                    dependencies: deps.dependency.into_iter().map(Into::into).collect(),
                });
            }
            for group in deps.group {
                dependency_groups.push(DependencyGroup {
                    target_framework: non_empty(group.target_framework),
                    dependencies: group.dependency.into_iter().map(Into::into).collect(),
                });
            }
        }

        Ok(Self {
            id,
            version,
            title: non_empty(meta.title),
            authors: non_empty(meta.authors),
            owners: non_empty(meta.owners),
            description: non_empty(meta.description),
            summary: non_empty(meta.summary),
            tags: non_empty(meta.tags),
            project_url: non_empty(meta.project_url),
            icon_url: non_empty(meta.icon_url),
            license_url: non_empty(meta.license_url),
            license_expression,
            copyright: non_empty(meta.copyright),
            release_notes: non_empty(meta.release_notes),
            require_license_acceptance: meta
                .require_license_acceptance
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("true")),
            min_client_version: non_empty(meta.min_client_version),
            language: non_empty(meta.language),
            dependency_groups,
        })
    }

    /// Title shown in the feed, falling back to the ID.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }

    /// Dependencies in the V2 wire form `id:range:framework|...`.
    ///
    /// A framework group without dependencies contributes `::framework`.
    pub fn dependencies_string(&self) -> String {
        let mut parts = Vec::new();
        for group in &self.dependency_groups {
            let framework = group.target_framework.as_deref().unwrap_or("");
            if group.dependencies.is_empty() {
                if !framework.is_empty() {
                    parts.push(format!("::{framework}"));
                }
                continue;
            }
            for dep in &group.dependencies {
                parts.push(format!(
                    "{}:{}:{framework}",
                    dep.id,
                    dep.version.as_deref().unwrap_or("")
                ));
            }
        }
        parts.join("|")
    }
}

/// Package IDs are ASCII letters, digits, `.`, `-` and `_`, never starting
/// with `.` and never containing `..`.
pub fn is_valid_id(id: &str) -> bool {
    is_safe_segment(id, |c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Versions are ASCII letters, digits, `.`, `-` and `+`, with the same
/// restrictions on dots as [`is_valid_id`].
pub fn is_valid_version(version: &str) -> bool {
    is_safe_segment(version, |c| {
        c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+')
    })
}

fn is_safe_segment(value: &str, allowed: impl Fn(char) -> bool) -> bool {
    !value.is_empty()
        && value.len() <= 128
        && !value.starts_with('.')
        && !value.contains("..")
        && value.chars().all(allowed)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
struct NuspecXml {
    metadata: MetadataXml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MetadataXml {
    #[serde(rename = "@minClientVersion")]
    min_client_version: Option<String>,
    id: Option<String>,
    version: Option<String>,
    title: Option<String>,
    authors: Option<String>,
    owners: Option<String>,
    description: Option<String>,
    summary: Option<String>,
    tags: Option<String>,
    project_url: Option<String>,
    icon_url: Option<String>,
    license_url: Option<String>,
    license: Option<LicenseXml>,
    copyright: Option<String>,
    release_notes: Option<String>,
    require_license_acceptance: Option<String>,
    language: Option<String>,
    dependencies: Option<DependenciesXml>,
}

#[derive(Debug, Default, Deserialize)]
struct LicenseXml {
    #[serde(rename = "@type", default)]
    kind: Option<String>,
    #[serde(rename = "$text", default)]
    value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DependenciesXml {
    group: Vec<GroupXml>,
    dependency: Vec<DependencyXml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GroupXml {
    #[serde(rename = "@targetFramework")]
    target_framework: Option<String>,
    dependency: Vec<DependencyXml>,
}

#[derive(Debug, Deserialize)]
struct DependencyXml {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@version", default)]
    version: Option<String>,
}

impl From<DependencyXml> for Dependency {
    fn from(d: DependencyXml) -> Self {
        Self {
            id: d.id,
            version: non_empty(d.version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUSPEC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
  <metadata minClientVersion="2.12">
    <id>Sample.Plugin</id>
    <version>1.0.0</version>
    <title>Sample Plugin</title>
    <authors>Jane Doe</authors>
    <requireLicenseAcceptance>false</requireLicenseAcceptance>
    <license type="expression">MIT</license>
    <description>A plugin used in tests.</description>
    <releaseNotes></releaseNotes>
    <tags>sample plugin</tags>
    <dependencies>
      <group targetFramework=".NETStandard2.0">
        <dependency id="Newtonsoft.Json" version="[12.0.1,)" />
      </group>
      <group targetFramework="net45" />
    </dependencies>
  </metadata>
</package>"#;

    #[test]
    fn test_parses_metadata_fields() {
        let m = PackageManifest::from_nuspec(NUSPEC).unwrap();
        assert_eq!(m.id, "Sample.Plugin");
        assert_eq!(m.version, "1.0.0");
        assert_eq!(m.display_title(), "Sample Plugin");
        assert_eq!(m.authors.as_deref(), Some("Jane Doe"));
        assert_eq!(m.license_expression.as_deref(), Some("MIT"));
        assert_eq!(m.min_client_version.as_deref(), Some("2.12"));
        assert!(!m.require_license_acceptance);
        assert_eq!(m.release_notes, None);
        assert_eq!(m.copyright, None);
    }

    #[test]
    fn test_dependencies_string() {
        let m = PackageManifest::from_nuspec(NUSPEC).unwrap();
        assert_eq!(
            m.dependencies_string(),
            "Newtonsoft.Json:[12.0.1,):.NETStandard2.0|::net45"
        );
    }

    #[test]
    fn test_flat_dependency_list() {
        let xml = r#"<package><metadata>
            <id>A</id><version>2.0</version>
            <dependencies><dependency id="B" version="1.0" /></dependencies>
        </metadata></package>"#;
        let m = PackageManifest::from_nuspec(xml).unwrap();
        assert_eq!(m.dependencies_string(), "B:1.0:");
        assert_eq!(m.display_title(), "A");
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let xml = "<package><metadata><version>1.0.0</version></metadata></package>";
        let err = PackageManifest::from_nuspec(xml).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedArchive);
    }

    #[test]
    fn test_path_like_id_is_malformed() {
        for id in ["../escaped", "a/b", "a\\b", "..", ".hidden", "a..b", "bad id"] {
            let xml = format!(
                "<package><metadata><id>{id}</id><version>1.0.0</version></metadata></package>"
            );
            let err = PackageManifest::from_nuspec(&xml).unwrap_err();
            assert_eq!(err.kind, ErrorKind::MalformedArchive, "id {id:?}");
        }
    }

    #[test]
    fn test_path_like_version_is_malformed() {
        for version in ["../1.0.0", "1.0/0", "1.0.0\u{7}"] {
            let xml = format!(
                "<package><metadata><id>A</id><version>{version}</version></metadata></package>"
            );
            let err = PackageManifest::from_nuspec(&xml).unwrap_err();
            assert_eq!(err.kind, ErrorKind::MalformedArchive, "version {version:?}");
        }
    }

    #[test]
    fn test_id_and_version_character_sets() {
        assert!(is_valid_id("Sample.Plugin"));
        assert!(is_valid_id("my-lib_2"));
        assert!(!is_valid_id(""));
        assert!(is_valid_version("1.0.0-beta.1+build.5"));
        assert!(!is_valid_version("1.0.0 beta"));
    }

    #[test]
    fn test_invalid_xml_is_malformed() {
        let err = PackageManifest::from_nuspec("not xml at all <<<").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedArchive);
    }
}
