//! Post URL content resolver.
//!
//! Posts live at the configured post URL pattern, by default
//! `(year)/(month)/(day)/(url)/`. [`PostUrlResolver`] is the content fallback
//! that recognizes such paths and hands them to the `view` action. It does
//! not check that the post exists; the action does.

use crate::pattern::{CompiledPattern, compile};
use lectern_core::{ContentMatch, ContentResolver, Params, PatternError, RequestPath};

/// The action that displays a single post.
pub const VIEW_ACTION: &str = "view";

/// Placeholders whose values must be numeric to match.
const NUMERIC_FIELDS: &[&str] = &["year", "month", "day", "hour", "minute", "second", "id"];

/// Matches request paths against the post URL pattern.
///
/// # Example
///
/// ```rust
/// use lectern_core::{ContentResolver, Params, RequestPath};
/// use lectern_std::content::PostUrlResolver;
///
/// let posts = PostUrlResolver::new("(year)/(month)/(url)/").unwrap();
/// let found = posts
///     .resolve_content(&RequestPath::parse("/2020/07/hello/"), &Params::new())
///     .unwrap();
/// assert_eq!(found.action, "view");
/// assert_eq!(found.params["url"], "hello");
/// ```
#[derive(Debug, Clone)]
pub struct PostUrlResolver {
    pattern: CompiledPattern,
}

impl PostUrlResolver {
    /// Compile the post URL pattern.
    pub fn new(post_url: &str) -> Result<Self, PatternError> {
        Ok(Self {
            pattern: compile(post_url)?,
        })
    }

    /// The compiled post URL pattern.
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }
}

impl ContentResolver for PostUrlResolver {
    fn resolve_content(&self, path: &RequestPath, _params: &Params) -> Option<ContentMatch> {
        if path.segments().len() != self.pattern.segment_count() {
            return None;
        }

        let values = self.pattern.match_named(path.request())?;
        let numeric_ok = values.iter().all(|(name, value)| {
            !NUMERIC_FIELDS.iter().any(|field| field == name)
                || value.bytes().all(|b| b.is_ascii_digit())
        });
        if !numeric_ok {
            return None;
        }

        Some(ContentMatch {
            action: VIEW_ACTION.to_string(),
            params: values.into_iter().collect(),
        })
    }
}
