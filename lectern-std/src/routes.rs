//! # Route Table
//!
//! Three sources of routing truth, consulted in a fixed order:
//!
//! 1. **Special built-ins** ([`SpecialRoute`]): `id`, `archive`, `search` and
//!    `random`, keyed by the first path segment. Checked by the resolver
//!    before anything else and never overridden.
//! 2. **Custom routes**: admin-defined, keyed by pattern, mutable at runtime.
//! 3. **Extension routes**: clean-URL translations contributed by enabled
//!    extensions at startup.
//!
//! Custom routes shadow extension routes. Inside each collection the first
//! registered pattern that matches wins.
//!
//! # Expansions
//!
//! A route maps a pattern to an expansion string: an action name optionally
//! followed by `;key=value` defaults, e.g. `page;url=home`. Expansions are
//! parsed once, when the route is added.

use crate::pattern::{CompiledPattern, compile};
use lectern_core::{Params, PatternError, RequestPath, decode_component};
use parking_lot::RwLock;
use std::sync::Arc;

/// A route table shared between the request path and admin mutations.
pub type SharedRoutes = Arc<RwLock<RouteTable>>;

// ============================================================================
// Special routes
// ============================================================================

/// Built-in routes recognized by their first path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialRoute {
    /// `/id/<name>/<value>/` - static ID of a post or page.
    Id,
    /// `/archive/<year>/<month>/<day>/` - archive drill-down.
    Archive,
    /// `/search/<query>/` - search results.
    Search,
    /// `/random/<feather>/` - a random post.
    Random,
}

static SPECIAL_ROUTES: phf::Map<&'static str, SpecialRoute> = phf::phf_map! {
    "id" => SpecialRoute::Id,
    "archive" => SpecialRoute::Archive,
    "search" => SpecialRoute::Search,
    "random" => SpecialRoute::Random,
};

impl SpecialRoute {
    /// Look up the special route claimed by a first path segment.
    pub fn lookup(segment: &str) -> Option<Self> {
        SPECIAL_ROUTES.get(segment).copied()
    }

    /// The action this route resolves to.
    pub const fn action(self) -> &'static str {
        match self {
            SpecialRoute::Id => "id",
            SpecialRoute::Archive => "archive",
            SpecialRoute::Search => "search",
            SpecialRoute::Random => "random",
        }
    }
}

// ============================================================================
// Expansions
// ============================================================================

/// Where a route's action name comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTarget {
    /// A fixed action name.
    Named(String),
    /// The first segment of the request path. Used when the expansion's
    /// action token is purely numeric.
    FirstSegment,
}

/// A parsed `action;key=value;...` expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    raw: String,
    target: ActionTarget,
    defaults: Vec<(String, String)>,
}

impl Expansion {
    /// Parse an expansion string.
    ///
    /// Defaults are split on `;` then on the first `=`; a missing value is
    /// empty and values are percent-decoded. Empty segments are skipped.
    pub fn parse(raw: &str) -> Self {
        let mut tokens = raw.split(';');
        let action = tokens.next().unwrap_or_default().trim();

        let target = if !action.is_empty() && action.bytes().all(|b| b.is_ascii_digit()) {
            ActionTarget::FirstSegment
        } else {
            ActionTarget::Named(action.to_string())
        };

        let defaults = tokens
            .filter(|token| !token.is_empty())
            .map(|token| match token.split_once('=') {
                Some((key, value)) => (key.to_string(), decode_component(value)),
                None => (token.to_string(), String::new()),
            })
            .collect();

        Self {
            raw: raw.to_string(),
            target,
            defaults,
        }
    }

    /// The expansion text as it was configured.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Where the action name comes from.
    pub fn target(&self) -> &ActionTarget {
        &self.target
    }

    /// Default parameters in declaration order.
    pub fn defaults(&self) -> &[(String, String)] {
        &self.defaults
    }

    /// The action for a request, or `None` when the action is taken from a
    /// first segment the request does not have.
    pub fn action_for(&self, path: &RequestPath) -> Option<String> {
        match &self.target {
            ActionTarget::Named(action) => Some(action.clone()),
            ActionTarget::FirstSegment => path.first().map(str::to_string),
        }
    }
}

// ============================================================================
// Entries
// ============================================================================

/// A compiled pattern paired with its expansion.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pattern: CompiledPattern,
    expansion: Expansion,
}

/// Which collection a route came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSource {
    /// An admin-defined custom route.
    Custom,
    /// A route contributed by the named extension.
    Extension(String),
}

/// A route that matched a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The action to dispatch.
    pub action: String,
    /// Placeholder values, then expansion defaults that did not collide.
    pub params: Params,
    /// The collection the route came from.
    pub source: RouteSource,
}

impl RouteEntry {
    /// Compile a route.
    pub fn new(pattern: &str, expansion: &str) -> Result<Self, PatternError> {
        Ok(Self {
            pattern: compile(pattern)?,
            expansion: Expansion::parse(expansion),
        })
    }

    /// The compiled pattern.
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    /// The parsed expansion.
    pub fn expansion(&self) -> &Expansion {
        &self.expansion
    }

    /// Apply the route to a request.
    ///
    /// Placeholder values populate same-named parameters; expansion defaults
    /// fill in only the names the placeholders left unset.
    pub fn apply(&self, path: &RequestPath) -> Option<(String, Params)> {
        let values = self.pattern.match_named(path.request())?;
        let action = self.expansion.action_for(path)?;

        let mut params: Params = values.into_iter().collect();
        for (key, value) in &self.expansion.defaults {
            params.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Some((action, params))
    }
}

// ============================================================================
// RouteTable
// ============================================================================

/// Custom and extension-contributed routes.
///
/// # Example
///
/// ```rust
/// use lectern_core::RequestPath;
/// use lectern_std::routes::{RouteSource, RouteTable};
///
/// let mut table = RouteTable::new();
/// table.contribute("tags", [("tag/(name)/", "tag")]).unwrap();
/// table.add_custom("tag/(name)/", "tag_archive;sort=new").unwrap();
///
/// let hit = table.lookup(&RequestPath::parse("/tag/rust/")).unwrap();
/// assert_eq!(hit.action, "tag_archive");
/// assert_eq!(hit.source, RouteSource::Custom);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    custom: Vec<RouteEntry>,
    extension: Vec<(String, RouteEntry)>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom route at the end of the custom collection.
    ///
    /// The table is keyed by pattern: re-adding an existing pattern replaces
    /// its expansion and keeps its position.
    pub fn add_custom(&mut self, pattern: &str, expansion: &str) -> Result<(), PatternError> {
        let entry = RouteEntry::new(pattern, expansion)?;

        match self.custom.iter_mut().find(|e| e.pattern.source() == pattern) {
            Some(existing) => *existing = entry,
            None => self.custom.push(entry),
        }
        tracing::info!(pattern, expansion, "custom route added");
        Ok(())
    }

    /// Remove a custom route by its exact pattern string.
    ///
    /// Removing a pattern that is not present is a no-op. Returns whether a
    /// route was removed.
    pub fn remove_custom(&mut self, pattern: &str) -> bool {
        let before = self.custom.len();
        self.custom.retain(|e| e.pattern.source() != pattern);

        let removed = self.custom.len() != before;
        if removed {
            tracing::info!(pattern, "custom route removed");
        }
        removed
    }

    /// Whether a custom route exists for `pattern`.
    pub fn has_custom(&self, pattern: &str) -> bool {
        self.custom(pattern).is_some()
    }

    /// The custom route for `pattern`.
    pub fn custom(&self, pattern: &str) -> Option<&RouteEntry> {
        self.custom.iter().find(|e| e.pattern.source() == pattern)
    }

    /// The custom route for the site root, if one is configured.
    pub fn homepage(&self) -> Option<&RouteEntry> {
        self.custom("/")
    }

    /// Custom routes in registration order.
    pub fn custom_routes(&self) -> impl Iterator<Item = &RouteEntry> {
        self.custom.iter()
    }

    /// Extension routes in contribution order, with their owners.
    pub fn extension_routes(&self) -> impl Iterator<Item = (&str, &RouteEntry)> {
        self.extension.iter().map(|(owner, entry)| (owner.as_str(), entry))
    }

    /// Append an extension's route contributions.
    ///
    /// Either every pattern compiles and all are appended, or nothing is.
    /// Returns the number of routes added.
    pub fn contribute<I, P, X>(&mut self, owner: &str, routes: I) -> Result<usize, PatternError>
    where
        I: IntoIterator<Item = (P, X)>,
        P: AsRef<str>,
        X: AsRef<str>,
    {
        let entries = routes
            .into_iter()
            .map(|(pattern, expansion)| RouteEntry::new(pattern.as_ref(), expansion.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let count = entries.len();
        self.extension
            .extend(entries.into_iter().map(|entry| (owner.to_string(), entry)));
        tracing::debug!(owner, count, "extension routes contributed");
        Ok(count)
    }

    /// Remove every route contributed by `owner`. Returns how many went.
    pub fn withdraw(&mut self, owner: &str) -> usize {
        let before = self.extension.len();
        self.extension.retain(|(o, _)| o != owner);
        before - self.extension.len()
    }

    /// Find the first route matching `path`: custom routes first, then
    /// extension routes, each in registration order.
    pub fn lookup(&self, path: &RequestPath) -> Option<RouteMatch> {
        let custom = self.custom.iter().map(|entry| (RouteSource::Custom, entry));
        let extension = self
            .extension
            .iter()
            .map(|(owner, entry)| (RouteSource::Extension(owner.clone()), entry));

        custom.chain(extension).find_map(|(source, entry)| {
            let (action, params) = entry.apply(path)?;
            tracing::debug!(
                pattern = entry.pattern.source(),
                action = %action,
                source = ?source,
                "route matched"
            );
            Some(RouteMatch {
                action,
                params,
                source,
            })
        })
    }

    /// Total number of custom and extension routes.
    pub fn len(&self) -> usize {
        self.custom.len() + self.extension.len()
    }

    /// Check if the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.custom.is_empty() && self.extension.is_empty()
    }
}
