//! Route pattern compilation.
//!
//! A route pattern is a path with `(name)` placeholders, e.g.
//! `category/(name)/`. Compiling it escapes the literal text, turns every
//! placeholder into a group matching one or more non-slash characters and
//! anchors the result at the start of the request. The lone pattern `/`
//! matches only the site root.
//!
//! Leading and trailing slashes in a pattern are not significant:
//! `category/(name)/`, `/category/(name)` and `category/(name)` compile to the
//! same matcher. The last literal or placeholder must end on a segment
//! boundary, so `tag` matches `/tag/x/` but not `/tagged/`.

use lectern_core::{PatternError, decode_component};
use regex::Regex;

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
    names: Vec<String>,
    pieces: Vec<Piece>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Placeholder,
}

/// Compile a route pattern.
///
/// Fails with [`PatternError`] when a placeholder name repeats, is empty, or
/// its parentheses do not balance.
///
/// # Example
///
/// ```rust
/// use lectern_std::pattern::compile;
///
/// let pattern = compile("category/(name)/").unwrap();
/// assert_eq!(pattern.names(), ["name"]);
/// assert_eq!(pattern.match_path("/category/rust/"), Some(vec!["rust".to_string()]));
/// assert_eq!(pattern.match_path("/tag/rust/"), None);
/// ```
pub fn compile(pattern: &str) -> Result<CompiledPattern, PatternError> {
    if pattern == "/" {
        return Ok(CompiledPattern {
            source: pattern.to_string(),
            regex: build_regex(pattern, "^/$")?,
            names: Vec::new(),
            pieces: Vec::new(),
        });
    }

    let unbalanced = || PatternError::UnbalancedParenthesis {
        pattern: pattern.to_string(),
    };

    let mut pieces = Vec::new();
    let mut names: Vec<String> = Vec::new();
    let mut rest = pattern.trim_matches('/');

    while let Some(open) = rest.find(['(', ')']) {
        if rest[open..].starts_with(')') {
            return Err(unbalanced());
        }
        if open > 0 {
            pieces.push(Piece::Literal(rest[..open].to_string()));
        }

        let after = &rest[open + 1..];
        let close = after.find(')').ok_or_else(unbalanced)?;
        let name = &after[..close];

        if name.contains('(') {
            return Err(unbalanced());
        }
        if name.is_empty() {
            return Err(PatternError::EmptyPlaceholder {
                pattern: pattern.to_string(),
            });
        }
        if names.iter().any(|existing| existing == name) {
            return Err(PatternError::DuplicatePlaceholder {
                pattern: pattern.to_string(),
                name: name.to_string(),
            });
        }

        names.push(name.to_string());
        pieces.push(Piece::Placeholder);
        rest = &after[close + 1..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest.to_string()));
    }

    let mut expr = String::from("^/");
    for piece in &pieces {
        match piece {
            Piece::Literal(text) => expr.push_str(&regex::escape(text)),
            Piece::Placeholder => expr.push_str("([^/]+)"),
        }
    }
    if !pieces.is_empty() {
        expr.push_str("(?:/|$)");
    }

    Ok(CompiledPattern {
        source: pattern.to_string(),
        regex: build_regex(pattern, &expr)?,
        names,
        pieces,
    })
}

fn build_regex(pattern: &str, expr: &str) -> Result<Regex, PatternError> {
    Regex::new(expr).map_err(|e| PatternError::InvalidRegex {
        pattern: pattern.to_string(),
        source: Box::new(e),
    })
}

impl CompiledPattern {
    /// The pattern text this was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Placeholder names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// True for the root pattern `/`.
    pub fn is_root(&self) -> bool {
        self.source == "/"
    }

    /// The number of path segments a request needs to match the whole
    /// pattern.
    pub fn segment_count(&self) -> usize {
        self.source.trim_matches('/').split('/').filter(|s| !s.is_empty()).count()
    }

    /// Match `path` and return the url-decoded placeholder values in
    /// declaration order.
    ///
    /// A path without a leading slash is treated as if it had one. `None` is
    /// the normal answer for a path the pattern does not cover.
    pub fn match_path(&self, path: &str) -> Option<Vec<String>> {
        if !path.starts_with('/') {
            return self.match_path(&format!("/{path}"));
        }
        let captures = self.regex.captures(path)?;

        Some(
            captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| decode_component(m.as_str())).unwrap_or_default())
                .collect(),
        )
    }

    /// Like [`match_path`](Self::match_path), pairing each value with its
    /// placeholder name.
    pub fn match_named(&self, path: &str) -> Option<Vec<(String, String)>> {
        let values = self.match_path(path)?;
        Some(self.names.iter().cloned().zip(values).collect())
    }

    /// Substitute `values` into the pattern, producing a request path.
    ///
    /// Values are url-encoded. Returns `None` unless exactly one value per
    /// placeholder is given.
    pub fn expand<S: AsRef<str>>(&self, values: &[S]) -> Option<String> {
        if values.len() != self.names.len() {
            return None;
        }
        if self.is_root() {
            return Some("/".to_string());
        }

        let mut values = values.iter();
        let mut path = String::from("/");
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => path.push_str(text),
                Piece::Placeholder => {
                    let value = values.next()?;
                    path.push_str(&urlencoding::encode(value.as_ref()));
                }
            }
        }
        if self.source.ends_with('/') {
            path.push('/');
        }
        Some(path)
    }
}
