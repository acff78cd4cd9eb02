//! Clean to dirty URL translation.
//!
//! Links are written in their clean form (`archive/2020/07/`). With clean
//! URLs enabled they are emitted as-is under the site base; otherwise they
//! are rewritten into query-string form (`/?action=archive&year=2020&month=07`)
//! by the first matching translation.
//!
//! Translations are tried in this order:
//!
//! 1. the built-in translations for the special routes and feeds,
//! 2. extension translations gathered through the `parse_urls` filter, each
//!    preceded by its `feed/` variant,
//! 3. the catch-all `/X/` to `/?action=X`.

use crate::trigger::Trigger;
use lectern_core::PatternError;
use once_cell::sync::Lazy;
use regex::Regex;

/// The filter extensions use to contribute translations, as a
/// `Vec<(String, String)>` of expression and replacement.
pub const PARSE_URLS_HOOK: &str = "parse_urls";

const MAIN_TRANSLATIONS: &[(&str, &str)] = &[
    (r"^/id/post/([0-9]+)/$", "/?action=id&post=${1}"),
    (r"^/id/page/([0-9]+)/$", "/?action=id&page=${1}"),
    (r"^/random/([^/]+)/$", "/?action=random&feather=${1}"),
    (r"^/search/([^/]+)/$", "/?action=search&query=${1}"),
    (
        r"^/archive/([0-9]{4})/([0-9]{2})/([0-9]{2})/$",
        "/?action=archive&year=${1}&month=${2}&day=${3}",
    ),
    (r"^/archive/([0-9]{4})/([0-9]{2})/$", "/?action=archive&year=${1}&month=${2}"),
    (r"^/archive/([0-9]{4})/$", "/?action=archive&year=${1}"),
    (r"^/([^/]+)/feed/$", "/?action=${1}&feed"),
];

static BUILT_IN: Lazy<Vec<UrlTranslation>> = Lazy::new(|| {
    MAIN_TRANSLATIONS
        .iter()
        .map(|(pattern, replacement)| {
            UrlTranslation::new(pattern, *replacement).expect("built-in translations compile")
        })
        .collect()
});

static CATCH_ALL: Lazy<UrlTranslation> = Lazy::new(|| {
    UrlTranslation::new(r"^/([^/]+)/$", "/?action=${1}").expect("catch-all translation compiles")
});

/// One clean to dirty rewrite rule.
#[derive(Debug, Clone)]
pub struct UrlTranslation {
    pattern: Regex,
    replacement: String,
}

impl UrlTranslation {
    /// Compile a translation. `replacement` may refer to groups as `${N}`.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, PatternError> {
        let pattern = Regex::new(pattern).map_err(|e| PatternError::InvalidTranslation {
            pattern: pattern.to_string(),
            source: Box::new(e),
        })?;
        Ok(Self {
            pattern,
            replacement: replacement.into(),
        })
    }

    /// The expression text.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Rewrite `path` if the expression matches it.
    pub fn apply(&self, path: &str) -> Option<String> {
        self.pattern
            .is_match(path)
            .then(|| self.pattern.replace(path, self.replacement.as_str()).into_owned())
    }

    /// The same translation for the `feed/` form of the path, producing a
    /// query string with `&feed` appended.
    pub fn feed_variant(&self) -> Result<Self, PatternError> {
        let source = self.pattern.as_str();
        let (body, anchored) = match source.strip_suffix('$') {
            Some(body) => (body, true),
            None => (source, false),
        };
        let separator = if body.ends_with('/') { "" } else { "/" };
        let end = if anchored { "$" } else { "" };

        Self::new(
            &format!("{body}{separator}feed/{end}"),
            format!("{}&feed", self.replacement),
        )
    }
}

/// Builds links in clean or dirty form.
///
/// # Example
///
/// ```rust
/// use lectern_std::trigger::Trigger;
/// use lectern_std::urls::UrlBuilder;
///
/// let dirty = UrlBuilder::new("https://example.com", false, Trigger::new());
/// assert_eq!(dirty.url("archive/2020/07"), "https://example.com/?action=archive&year=2020&month=07");
///
/// let clean = UrlBuilder::new("https://example.com/", true, Trigger::new());
/// assert_eq!(clean.url("archive/2020/07"), "https://example.com/archive/2020/07/");
/// ```
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: String,
    clean: bool,
    trigger: Trigger,
}

impl UrlBuilder {
    /// Create a builder for the site at `base`.
    pub fn new(base: &str, clean: bool, trigger: Trigger) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            clean,
            trigger,
        }
    }

    /// The site base, without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Whether links are emitted in clean form.
    pub fn is_clean(&self) -> bool {
        self.clean
    }

    /// Switch between clean and dirty links.
    pub fn set_clean(&mut self, clean: bool) {
        self.clean = clean;
    }

    /// Build the absolute link for a clean path.
    ///
    /// A path already starting with `/` is taken to be in final form and is
    /// only prefixed with the base.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            return format!("{}{path}", self.base);
        }

        let clean = if path.ends_with('/') || path.is_empty() {
            format!("/{path}")
        } else {
            format!("/{path}/")
        };
        if self.clean {
            return format!("{}{clean}", self.base);
        }

        let dirty = self.translate(&clean).unwrap_or(clean);
        format!("{}{dirty}", self.base)
    }

    fn translate(&self, clean: &str) -> Option<String> {
        if let Some(dirty) = BUILT_IN.iter().find_map(|t| t.apply(clean)) {
            return Some(dirty);
        }

        let contributed: Vec<(String, String)> =
            self.trigger.filter(PARSE_URLS_HOOK, Vec::new());
        for (pattern, replacement) in contributed {
            let translation = match UrlTranslation::new(&pattern, replacement) {
                Ok(translation) => translation,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping URL translation");
                    continue;
                }
            };
            let feed = translation.feed_variant().ok();
            if let Some(dirty) = feed.and_then(|f| f.apply(clean)) {
                return Some(dirty);
            }
            if let Some(dirty) = translation.apply(clean) {
                return Some(dirty);
            }
        }

        CATCH_ALL.apply(clean)
    }
}
