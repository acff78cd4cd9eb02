//! Request paths and the parameter store.

use std::collections::BTreeMap;

/// The request-scoped parameter store: parameter name to decoded value.
pub type Params = BTreeMap<String, String>;

/// Decodes one url-encoded component.
///
/// `+` is treated as a space, as in form encoding. Sequences that do not
/// decode to UTF-8 are replaced rather than rejected.
pub fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes()))
            .into_owned(),
    }
}

/// A request path normalized for resolution.
///
/// The `request` string always starts with `/` and never carries a query
/// string or fragment. `segments` are the non-empty, url-decoded path
/// segments.
///
/// # Example
///
/// ```rust
/// use lectern_core::RequestPath;
///
/// let path = RequestPath::parse("search/hello%20world/?utm=x");
/// assert_eq!(path.request(), "/search/hello%20world/");
/// assert_eq!(path.segments(), ["search", "hello world"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    request: String,
    segments: Vec<String>,
}

impl RequestPath {
    /// Normalize a raw request path.
    pub fn parse(raw: &str) -> Self {
        let path = raw.split(['?', '#']).next().unwrap_or_default();
        let request = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let segments = request
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(decode_component)
            .collect();

        Self { request, segments }
    }

    /// The normalized request string, with a leading slash.
    pub fn request(&self) -> &str {
        &self.request
    }

    /// The decoded path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The segment at `index`, if present.
    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    /// The first segment, if any.
    pub fn first(&self) -> Option<&str> {
        self.segment(0)
    }

    /// True when the path has no segments at all.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl From<&str> for RequestPath {
    fn from(raw: &str) -> Self {
        RequestPath::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_adds_leading_slash() {
        let path = RequestPath::parse("archive/2020/");
        assert_eq!(path.request(), "/archive/2020/");
        assert_eq!(path.segments(), ["archive", "2020"]);
    }

    #[test]
    fn test_parse_strips_query_and_fragment() {
        let path = RequestPath::parse("/random/text/?x=1#top");
        assert_eq!(path.request(), "/random/text/");
        assert_eq!(path.first(), Some("random"));
    }

    #[test]
    fn test_root_paths() {
        assert!(RequestPath::parse("").is_root());
        assert!(RequestPath::parse("/").is_root());
        assert!(RequestPath::parse("/?page=2").is_root());
    }

    #[test]
    fn test_decode_component() {
        assert_eq!(decode_component("a%20b"), "a b");
        assert_eq!(decode_component("a+b"), "a b");
        assert_eq!(decode_component("caf%C3%A9"), "café");
        assert_eq!(decode_component("bad%FF"), "bad\u{FFFD}");
    }
}
