//! # Request Resolver
//!
//! Turns a raw request path into a [`Resolution`] by running an ordered chain
//! of detectors. The first detector that applies decides the action:
//!
//! | # | Detector   | Applies when                         | Action       |
//! |---|------------|--------------------------------------|--------------|
//! | 1 | root       | path is `/`                          | homepage or `index` |
//! | 2 | feed       | last segment is `feed`               | strips it, sets `is_feed` |
//! | 3 | id         | first segment is `id`                | `id`         |
//! | 4 | pagination | `/<scope_>page/<N>/` anywhere        | strips it, continues |
//! | 5 | archive    | first segment is `archive`           | `archive`    |
//! | 6 | search     | first segment is `search`            | `search`     |
//! | 7 | random     | first segment is `random`            | `random`     |
//! | 8 | routes     | a custom or extension route matches  | route action |
//! | 9 | content    | a [`ContentResolver`] claims the path | its action  |
//!
//! Feed and pagination only strip their tokens and record parameters; the
//! remaining detectors then run against what is left.

use crate::routes::{RouteTable, SpecialRoute};
use lectern_core::{
    ContentResolver, Params, RequestPath, Resolution, ResolvedRoute, UnresolvedRoute,
    decode_component,
};

/// The action for a bare root request with no homepage route.
pub const INDEX_ACTION: &str = "index";

const ARCHIVE_FIELDS: [&str; 3] = ["year", "month", "day"];

/// Resolves request paths against a [`RouteTable`] and content resolvers.
///
/// The resolver holds no routing state of its own; the route table is passed
/// to every call so admin mutations are visible immediately.
///
/// # Example
///
/// ```rust
/// use lectern_std::resolver::Resolver;
/// use lectern_std::routes::RouteTable;
///
/// let resolver = Resolver::new();
/// let routes = RouteTable::new();
///
/// let resolution = resolver.resolve(&routes, "/archive/2020/07/");
/// let route = resolution.as_resolved().unwrap();
/// assert_eq!(route.action, "archive");
/// assert_eq!(route.param("month"), Some("07"));
/// assert_eq!(route.param("day"), None);
/// ```
#[derive(Default)]
pub struct Resolver {
    content: Vec<Box<dyn ContentResolver>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("content_resolvers", &self.content.len())
            .finish()
    }
}

/// Working state threaded through the detectors.
struct Pending<'a> {
    raw: Vec<&'a str>,
    params: Params,
    is_feed: bool,
}

impl Pending<'_> {
    fn path(&self) -> RequestPath {
        if self.raw.is_empty() {
            RequestPath::parse("/")
        } else {
            RequestPath::parse(&format!("/{}/", self.raw.join("/")))
        }
    }

    fn resolved(self, action: impl Into<String>) -> Resolution {
        Resolution::Resolved(ResolvedRoute {
            action: action.into(),
            params: self.params,
            is_feed: self.is_feed,
        })
    }
}

impl Resolver {
    /// Create a resolver with no content resolvers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a content resolver (builder style).
    pub fn with_content<C: ContentResolver + 'static>(mut self, content: C) -> Self {
        self.push_content(content);
        self
    }

    /// Add a content resolver. Resolvers are consulted in insertion order.
    pub fn push_content<C: ContentResolver + 'static>(&mut self, content: C) {
        self.push_boxed(Box::new(content));
    }

    /// Add an already boxed content resolver.
    pub fn push_boxed(&mut self, content: Box<dyn ContentResolver>) {
        self.content.push(content);
    }

    /// Resolve a raw request path.
    pub fn resolve(&self, routes: &RouteTable, raw: &str) -> Resolution {
        let request = RequestPath::parse(raw);
        let mut pending = Pending {
            raw: request.request().split('/').filter(|s| !s.is_empty()).collect(),
            params: Params::new(),
            is_feed: false,
        };

        if pending.raw.is_empty() {
            return Self::root(routes, pending);
        }

        if pending.raw.last() == Some(&"feed") {
            pending.raw.pop();
            pending.is_feed = true;
            tracing::debug!(request = request.request(), "feed requested");
            if pending.raw.is_empty() {
                return pending.resolved(INDEX_ACTION);
            }
        }

        let first = decode_component(pending.raw[0]);
        if SpecialRoute::lookup(&first) == Some(SpecialRoute::Id) {
            if let [_, name, value, ..] = pending.raw[..] {
                pending
                    .params
                    .insert(decode_component(name), decode_component(value));
            }
            tracing::debug!(request = request.request(), "static id route");
            return pending.resolved(SpecialRoute::Id.action());
        }

        if Self::strip_pagination(&mut pending) && pending.raw.is_empty() {
            return Self::root(routes, pending);
        }

        let path = pending.path();
        if let Some(special) = path.first().and_then(SpecialRoute::lookup) {
            Self::special(special, &path, &mut pending.params);
            tracing::debug!(request = request.request(), action = special.action(), "special route");
            return pending.resolved(special.action());
        }

        if let Some(hit) = routes.lookup(&path) {
            for (key, value) in hit.params {
                pending.params.entry(key).or_insert(value);
            }
            return pending.resolved(hit.action);
        }

        for content in &self.content {
            if let Some(found) = content.resolve_content(&path, &pending.params) {
                tracing::debug!(request = request.request(), action = %found.action, "content match");
                pending.params.extend(found.params);
                return pending.resolved(found.action);
            }
        }

        tracing::debug!(request = request.request(), "unresolved");
        Resolution::Unresolved(UnresolvedRoute {
            request: request.request().to_string(),
            params: pending.params,
            is_feed: pending.is_feed,
        })
    }

    /// The root resolves to the homepage route when one exists, else `index`.
    fn root(routes: &RouteTable, mut pending: Pending<'_>) -> Resolution {
        let Some((action, params)) = routes
            .homepage()
            .and_then(|home| home.apply(&RequestPath::parse("/")))
        else {
            return pending.resolved(INDEX_ACTION);
        };

        for (key, value) in params {
            pending.params.entry(key).or_insert(value);
        }
        pending.resolved(action)
    }

    /// Remove every `<scope_>page/<N>` pair, recording `<scope_>page = N`.
    ///
    /// Returns whether anything was stripped.
    fn strip_pagination(pending: &mut Pending<'_>) -> bool {
        let mut stripped = false;
        let mut index = 0;

        while index + 1 < pending.raw.len() {
            let token = pending.raw[index];
            let number = pending.raw[index + 1];

            if is_page_token(token) && is_numeric(number) {
                pending.params.insert(token.to_string(), number.to_string());
                pending.raw.drain(index..index + 2);
                stripped = true;
                tracing::debug!(param = token, page = number, "pagination");
            } else {
                index += 1;
            }
        }
        stripped
    }

    fn special(route: SpecialRoute, path: &RequestPath, params: &mut Params) {
        match route {
            SpecialRoute::Archive => {
                let values = path.segments()[1..].iter().take_while(|s| is_numeric(s));
                for (field, value) in ARCHIVE_FIELDS.iter().zip(values) {
                    params.insert(field.to_string(), value.clone());
                }
            }
            SpecialRoute::Search => {
                if let Some(query) = path.segment(1) {
                    params.insert("query".into(), query.to_string());
                }
            }
            SpecialRoute::Random => {
                if let Some(feather) = path.segment(1) {
                    params.insert("feather".into(), feather.to_string());
                }
            }
            SpecialRoute::Id => {}
        }
    }
}

/// `page`, or `<scope>_page` with a non-empty scope free of underscores.
fn is_page_token(token: &str) -> bool {
    match token.strip_suffix("_page") {
        Some(scope) => !scope.is_empty() && !scope.contains('_'),
        None => token == "page",
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_core::ContentMatch;

    fn resolve(routes: &RouteTable, raw: &str) -> ResolvedRoute {
        Resolver::new()
            .resolve(routes, raw)
            .into_resolved()
            .unwrap_or_else(|| panic!("{raw} should resolve"))
    }

    #[test]
    fn test_root_is_index() {
        let route = resolve(&RouteTable::new(), "/");
        assert_eq!(route.action, "index");
        assert!(route.params.is_empty());
        assert!(!route.is_feed);
    }

    #[test]
    fn test_root_uses_homepage_route() {
        let mut routes = RouteTable::new();
        routes.add_custom("/", "page;url=home").unwrap();

        let route = resolve(&routes, "/");
        assert_eq!(route.action, "page");
        assert_eq!(route.param("url"), Some("home"));
    }

    #[test]
    fn test_feed_suffix() {
        let route = resolve(&RouteTable::new(), "/feed/");
        assert_eq!(route.action, "index");
        assert!(route.is_feed);

        let route = resolve(&RouteTable::new(), "/search/rust/feed");
        assert_eq!(route.action, "search");
        assert_eq!(route.param("query"), Some("rust"));
        assert!(route.is_feed);
    }

    #[test]
    fn test_static_id() {
        let route = resolve(&RouteTable::new(), "/id/post/42/");
        assert_eq!(route.action, "id");
        assert_eq!(route.param("post"), Some("42"));

        let bare = resolve(&RouteTable::new(), "/id/");
        assert_eq!(bare.action, "id");
        assert!(bare.params.is_empty());
    }

    #[test]
    fn test_pagination_is_stripped() {
        let mut routes = RouteTable::new();
        routes.contribute("blog", [("blog/", "blog")]).unwrap();

        let route = resolve(&routes, "/blog/page/3/");
        assert_eq!(route.action, "blog");
        assert_eq!(route.page("page"), Some(3));
    }

    #[test]
    fn test_scoped_pagination() {
        let mut routes = RouteTable::new();
        routes.contribute("categorize", [("category/(name)/", "category")]).unwrap();

        let route = resolve(&routes, "/category/rust/category_page/2/");
        assert_eq!(route.action, "category");
        assert_eq!(route.param("name"), Some("rust"));
        assert_eq!(route.page("category_page"), Some(2));
        assert_eq!(route.page("page"), None);
    }

    #[test]
    fn test_paginated_root() {
        let route = resolve(&RouteTable::new(), "/page/2/");
        assert_eq!(route.action, "index");
        assert_eq!(route.page("page"), Some(2));

        let mut routes = RouteTable::new();
        routes.add_custom("/", "page;url=home").unwrap();
        let route = resolve(&routes, "/page/2/");
        assert_eq!(route.action, "page");
        assert_eq!(route.param("url"), Some("home"));
        assert_eq!(route.page("page"), Some(2));
    }

    #[test]
    fn test_non_numeric_page_is_not_pagination() {
        let resolution = Resolver::new().resolve(&RouteTable::new(), "/page/two/");
        assert!(!resolution.is_resolved());
        assert!(resolution.params().is_empty());
    }

    #[test]
    fn test_archive_scan() {
        let route = resolve(&RouteTable::new(), "/archive/2020/07/");
        assert_eq!(route.action, "archive");
        assert_eq!(route.param("year"), Some("2020"));
        assert_eq!(route.param("month"), Some("07"));
        assert_eq!(route.param("day"), None);

        let route = resolve(&RouteTable::new(), "/archive/2020/xx/15/");
        assert_eq!(route.param("year"), Some("2020"));
        assert_eq!(route.params.len(), 1);
    }

    #[test]
    fn test_search_and_random() {
        let route = resolve(&RouteTable::new(), "/search/hello%20world/");
        assert_eq!(route.action, "search");
        assert_eq!(route.param("query"), Some("hello world"));

        let route = resolve(&RouteTable::new(), "/random/photo/");
        assert_eq!(route.action, "random");
        assert_eq!(route.param("feather"), Some("photo"));
    }

    #[test]
    fn test_special_routes_are_never_shadowed() {
        let mut routes = RouteTable::new();
        routes.add_custom("search/(q)/", "lookup").unwrap();

        let route = resolve(&routes, "/search/x/");
        assert_eq!(route.action, "search");
        assert_eq!(route.param("q"), None);
    }

    #[test]
    fn test_content_fallback() {
        let resolver = Resolver::new().with_content(|path: &RequestPath, _: &Params| {
            (path.first() == Some("about")).then(|| ContentMatch::new("page").with_param("url", "about"))
        });
        let routes = RouteTable::new();

        let route = resolver.resolve(&routes, "/about/").into_resolved().unwrap();
        assert_eq!(route.action, "page");
        assert_eq!(route.param("url"), Some("about"));

        let missing = resolver.resolve(&routes, "/contact/page/2/");
        let Resolution::Unresolved(unresolved) = missing else {
            panic!("expected unresolved");
        };
        assert_eq!(unresolved.request, "/contact/page/2/");
        assert_eq!(unresolved.params.get("page").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_page_tokens() {
        assert!(is_page_token("page"));
        assert!(is_page_token("comments_page"));
        assert!(!is_page_token("_page"));
        assert!(!is_page_token("a_b_page"));
        assert!(!is_page_token("pages"));
    }
}
