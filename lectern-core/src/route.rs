//! Resolution results.

use crate::request::Params;

/// The outcome of resolving a request path to an action.
///
/// Produced fresh for every request and never mutated once handed to the
/// dispatcher. Handlers that need a mutable view copy the parameters into
/// their own request-scoped store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    /// The action that should handle the request.
    pub action: String,
    /// Parameters extracted from the path and route defaults.
    pub params: Params,
    /// Whether the request asked for a feed.
    pub is_feed: bool,
}

impl ResolvedRoute {
    /// Create a route for `action` with no parameters.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            params: Params::new(),
            is_feed: false,
        }
    }

    /// Look up a parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Look up a pagination parameter as a number.
    ///
    /// `name` is the full parameter name, e.g. `page` or `comments_page`.
    pub fn page(&self, name: &str) -> Option<u64> {
        self.param(name).and_then(|value| value.parse().ok())
    }

    /// The hook an extension registers to serve this action as a feed.
    pub fn feed_hook(&self) -> String {
        format!("{}_feed", self.action)
    }
}

/// A request for which no detector, route or content resolver produced an
/// action.
///
/// Whatever the detectors extracted before giving up (pagination, the feed
/// flag) is kept so a not-found page can still be rendered sensibly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRoute {
    /// The normalized request that failed to resolve.
    pub request: String,
    /// Parameters extracted before resolution gave up.
    pub params: Params,
    /// Whether the request asked for a feed.
    pub is_feed: bool,
}

/// The result of `resolve`.
///
/// `Unresolved` is a normal outcome, not an error: the request-handling code
/// decides whether it becomes a not-found response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// An action was found.
    Resolved(ResolvedRoute),
    /// Nothing claimed the request.
    Unresolved(UnresolvedRoute),
}

impl Resolution {
    /// Returns true if an action was found.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    /// The resolved action name, if any.
    pub fn action(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(route) => Some(&route.action),
            Resolution::Unresolved(_) => None,
        }
    }

    /// Borrow the resolved route, if any.
    pub fn as_resolved(&self) -> Option<&ResolvedRoute> {
        match self {
            Resolution::Resolved(route) => Some(route),
            Resolution::Unresolved(_) => None,
        }
    }

    /// Take the resolved route, if any.
    pub fn into_resolved(self) -> Option<ResolvedRoute> {
        match self {
            Resolution::Resolved(route) => Some(route),
            Resolution::Unresolved(_) => None,
        }
    }

    /// The parameters gathered, resolved or not.
    pub fn params(&self) -> &Params {
        match self {
            Resolution::Resolved(route) => &route.params,
            Resolution::Unresolved(unresolved) => &unresolved.params,
        }
    }

    /// Whether a feed was requested, resolved or not.
    pub fn is_feed(&self) -> bool {
        match self {
            Resolution::Resolved(route) => route.is_feed,
            Resolution::Unresolved(unresolved) => unresolved.is_feed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_parses_numbers_only() {
        let mut route = ResolvedRoute::new("index");
        route.params.insert("page".into(), "3".into());
        route.params.insert("comments_page".into(), "x".into());

        assert_eq!(route.page("page"), Some(3));
        assert_eq!(route.page("comments_page"), None);
        assert_eq!(route.page("missing"), None);
    }

    #[test]
    fn test_feed_hook_name() {
        assert_eq!(ResolvedRoute::new("category").feed_hook(), "category_feed");
    }

    #[test]
    fn test_resolution_helpers() {
        let resolved = Resolution::Resolved(ResolvedRoute::new("search"));
        assert!(resolved.is_resolved());
        assert_eq!(resolved.action(), Some("search"));

        let unresolved = Resolution::Unresolved(UnresolvedRoute {
            request: "/nowhere/".into(),
            params: Params::new(),
            is_feed: true,
        });
        assert!(!unresolved.is_resolved());
        assert!(unresolved.is_feed());
        assert_eq!(unresolved.into_resolved(), None);
    }
}
