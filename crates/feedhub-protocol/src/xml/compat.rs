//! Post-serialization repairs.
//!
//! Clients expect literal apostrophes inside attribute values such as
//! `Packages(Id='x')` and cannot parse `<tag></tag>`, so the serialized text
//! is patched before it leaves the server.

use super::PLACEHOLDER_BASE_URL;

/// Declaration prepended to every document.
pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Turn writer output into the final response body.
pub fn finish(body: Vec<u8>, base_url: &str) -> Vec<u8> {
    let body = String::from_utf8_lossy(&body);
    let mut out = String::with_capacity(XML_HEADER.len() + body.len());
    out.push_str(XML_HEADER);
    out.push_str(&unescape_apostrophes(&body));
    let out = self_close_empty_elements(out);
    out.replace(PLACEHOLDER_BASE_URL, base_url).into_bytes()
}

/// `&#39;` and `&apos;` back to `'`.
pub fn unescape_apostrophes(body: &str) -> String {
    body.replace("&#39;", "'").replace("&apos;", "'")
}

/// Rewrite every `<tag attrs></tag>` as `<tag attrs />`.
///
/// Only a start tag immediately followed by its own end tag is collapsed;
/// `</a></b>` and mismatched pairs are left alone.
pub fn self_close_empty_elements(body: String) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body.as_str();
    while let Some(pos) = rest.find("></") {
        let (head, tail) = rest.split_at(pos);
        out.push_str(head);
        match empty_close_len(head, &tail[1..]) {
            Some(close_len) => {
                out.push_str(" />");
                rest = &tail[1 + close_len..];
            }
            None => {
                out.push('>');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Length of the end tag at the start of `after` when it closes the start
/// tag that `head` ends with.
fn empty_close_len(head: &str, after: &str) -> Option<usize> {
    let tag = &head[head.rfind('<')? + 1..];
    if tag.starts_with(['/', '?', '!']) || tag.ends_with('/') {
        return None;
    }
    let name = tag.split(char::is_whitespace).next().filter(|n| !n.is_empty())?;
    let close = format!("</{name}>");
    after.starts_with(&close).then_some(close.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_close_empty_elements() {
        let out = self_close_empty_elements(
            "<a><b x=\"1\"></b><c></c><d>text</d></a>".to_string(),
        );
        assert_eq!(out, "<a><b x=\"1\" /><c /><d>text</d></a>");
    }

    #[test]
    fn test_nested_close_tags_are_kept() {
        let out = self_close_empty_elements(
            "<feed><entry><m:properties><d:Id>A</d:Id><d:Notes m:null=\"true\"></d:Notes></m:properties></entry></feed>".to_string(),
        );
        assert_eq!(
            out,
            "<feed><entry><m:properties><d:Id>A</d:Id><d:Notes m:null=\"true\" /></m:properties></entry></feed>"
        );
    }

    #[test]
    fn test_mismatched_pair_is_left_alone() {
        let input = "<a></b><c/></c>".to_string();
        assert_eq!(self_close_empty_elements(input.clone()), input);
    }

    #[test]
    fn test_unescape_apostrophes() {
        assert_eq!(
            unescape_apostrophes("href=\"Packages(Id=&apos;A&apos;,Version=&#39;1&#39;)\""),
            "href=\"Packages(Id='A',Version='1')\""
        );
    }

    #[test]
    fn test_finish_replaces_placeholder_and_adds_header() {
        let body = b"<id>http://hosturl/Packages</id><x></x>".to_vec();
        let out = String::from_utf8(finish(body, "https://feed.example.com/")).unwrap();
        assert_eq!(
            out,
            format!("{XML_HEADER}<id>https://feed.example.com/Packages</id><x />")
        );
    }
}
