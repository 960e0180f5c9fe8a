//! Version ordering used to decide which version of a package is latest.
//!
//! Package versions are not strictly semver: NuGet allows one, two or four
//! numeric parts. Versions that can be lifted into semver are compared by
//! semver precedence; anything else falls back to plain string order.

use std::cmp::Ordering;

/// Total order over version strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (lenient_semver(a), lenient_semver(b)) {
        (Some(x), Some(y)) => x.cmp_precedence(&y).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

/// The greatest version in `versions`, if any.
pub fn max_version<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .max_by(|a, b| compare_versions(a, b))
}

/// Whether a version carries a prerelease label (`1.0.0-beta`).
pub fn is_prerelease(version: &str) -> bool {
    version
        .split('+')
        .next()
        .is_some_and(|release| release.contains('-'))
}

fn lenient_semver(version: &str) -> Option<semver::Version> {
    let version = version.trim();
    let split = version.find(['-', '+']).unwrap_or(version.len());
    let (release, suffix) = version.split_at(split);

    let mut parts: Vec<&str> = release.split('.').collect();
    if parts.len() == 4 && parts[3] == "0" {
        parts.pop();
    }
    if parts.len() > 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0");
    }

    semver::Version::parse(&format!("{}{suffix}", parts.join("."))).ok()
}
