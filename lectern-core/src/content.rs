//! The content-lookup collaborator.
//!
//! When no built-in detector and no route claims a request, the resolver asks
//! each registered [`ContentResolver`] in turn whether the path names a piece
//! of content (a post, a page). Whether that content actually exists is the
//! collaborator's business; the engine only consumes the answer.

use crate::request::{Params, RequestPath};

/// The action and parameters a content resolver assigns to a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMatch {
    /// The action that renders the content, e.g. `view` or `page`.
    pub action: String,
    /// Parameters identifying the content.
    pub params: Params,
}

impl ContentMatch {
    /// Create a match with no parameters.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            params: Params::new(),
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// Last-resort lookup of a path against stored content.
///
/// `params` holds what the detectors extracted so far (pagination, for
/// instance); resolvers may read it but contribute through the returned
/// [`ContentMatch`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `ContentResolver`",
    label = "missing `ContentResolver` implementation",
    note = "Implement `resolve_content`, or pass a closure `Fn(&RequestPath, &Params) -> Option<ContentMatch>`."
)]
pub trait ContentResolver: Send + Sync {
    /// Return the action for `path`, or `None` if it names no content.
    fn resolve_content(&self, path: &RequestPath, params: &Params) -> Option<ContentMatch>;
}

// Blanket impl for closures
impl<F> ContentResolver for F
where
    F: Fn(&RequestPath, &Params) -> Option<ContentMatch> + Send + Sync,
{
    fn resolve_content(&self, path: &RequestPath, params: &Params) -> Option<ContentMatch> {
        (self)(path, params)
    }
}
