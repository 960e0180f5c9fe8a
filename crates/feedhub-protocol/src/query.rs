//! Request parameter parsing.
//!
//! Clients address packages with OData function-call syntax
//! (`Packages(Id='Foo',Version='1.0.0')`) and filter listings with a single
//! `$filter` shape. Both parsers are lenient: malformed input yields an empty
//! or partial result, never an error.

/// Parameters carried in a `Packages(...)` path segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageParams {
    pub id: String,
    pub version: String,
}

impl PackageParams {
    /// Both ID and version present, i.e. the request names a single entry.
    pub fn is_entry(&self) -> bool {
        !self.id.is_empty() && !self.version.is_empty()
    }
}

/// The text between the first `(` and the following `)` of a path.
///
/// Returns `""` when the path has no parentheses. An unclosed `(` yields
/// everything after it.
pub fn function_segment(path: &str) -> &str {
    let Some(open) = path.find('(') else {
        return "";
    };
    let rest = &path[open + 1..];
    match rest.find(')') {
        Some(close) => &rest[..close],
        None => rest,
    }
}

/// Scan `key='value'` pairs separated by commas.
///
/// Values are read literally up to the next `'`; there is no escaping.
/// Keys other than `Id` and `Version` are ignored.
pub fn parse_function_params(segment: &str) -> PackageParams {
    let mut params = PackageParams::default();
    let mut rest = segment;

    while let Some(eq) = rest.find('=') {
        let key = rest[..eq].trim_matches(|c: char| c == ',' || c.is_whitespace());
        let after_eq = &rest[eq + 1..];

        let Some(open) = after_eq.find('\'') else {
            break;
        };
        let quoted = &after_eq[open + 1..];
        let Some(close) = quoted.find('\'') else {
            break;
        };
        let value = &quoted[..close];

        match key {
            "Id" => params.id = value.to_string(),
            "Version" => params.version = value.to_string(),
            _ => {}
        }

        rest = &quoted[close + 1..];
    }

    params
}

/// Extract the ID from `tolower(Id) eq 'value'`.
///
/// Any other shape, or an empty value, means "no filter".
pub fn parse_filter(filter: &str) -> Option<String> {
    let rest = filter.trim().strip_prefix("tolower(Id)")?;
    let rest = rest.trim_start();
    let rest = rest.strip_prefix("eq")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    parse_quoted_value(rest.trim()).filter(|v| !v.is_empty())
}

/// Strip one pair of surrounding single quotes: `'Foo'` → `Foo`.
pub fn parse_quoted_value(raw: &str) -> Option<String> {
    let inner = raw.trim().strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.to_string())
}
