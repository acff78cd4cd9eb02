//! Error types for Lectern.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`LecternError`] - Top-level error type for all Lectern operations
//! - [`PatternError`] - Errors compiling route patterns and URL translations
//! - [`HookError`] - Failures of individual hook handlers
//! - [`DispatchError`] - Outcomes of action dispatch that produced no result
//! - [`ConfigError`] - Errors loading or saving engine configuration
//!
//! Note that a pattern that does not match a path is *not* an error: lookups
//! return `Option` and resolution returns [`Resolution`](crate::Resolution).

use std::path::PathBuf;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Lectern operations.
#[derive(Error, Debug)]
pub enum LecternError {
    /// A route pattern or URL translation could not be compiled.
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// A hook handler failed.
    #[error("hook error: {0}")]
    Hook(#[from] HookError),

    /// An action could not be dispatched.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// The configuration could not be loaded or saved.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors raised while compiling a route pattern.
///
/// These are fatal at registration time: an extension contributing a bad
/// pattern fails to load, and an admin route submission is rejected.
#[derive(Error, Debug)]
pub enum PatternError {
    /// Two placeholders in the same pattern share a name.
    #[error("placeholder `({name})` appears more than once in pattern `{pattern}`")]
    DuplicatePlaceholder {
        /// The offending pattern.
        pattern: String,
        /// The repeated placeholder name.
        name: String,
    },

    /// A placeholder has no name, e.g. `post/()/`.
    #[error("empty placeholder in pattern `{pattern}`")]
    EmptyPlaceholder {
        /// The offending pattern.
        pattern: String,
    },

    /// A `(` without a matching `)` or the reverse.
    #[error("unbalanced parenthesis in pattern `{pattern}`")]
    UnbalancedParenthesis {
        /// The offending pattern.
        pattern: String,
    },

    /// The generated expression was rejected by the regex engine.
    #[error("pattern `{pattern}` does not compile")]
    InvalidRegex {
        /// The offending pattern.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: BoxError,
    },

    /// A clean-to-dirty URL translation expression does not compile.
    #[error("URL translation `{pattern}` does not compile")]
    InvalidTranslation {
        /// The offending expression.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: BoxError,
    },
}

/// Failure of a single hook handler.
///
/// Hook errors never escape `call` or `filter`; the dispatcher logs them and
/// carries on with the next handler.
#[derive(Error, Debug)]
pub enum HookError {
    /// The handler returned an error.
    #[error("handler from `{owner}` on `{hook}` failed")]
    Failed {
        /// The hook name that was fired (after alias resolution).
        hook: String,
        /// The extension that registered the handler.
        owner: String,
        /// The handler's error.
        #[source]
        source: BoxError,
    },

    /// The handler panicked.
    #[error("handler from `{owner}` on `{hook}` panicked: {message}")]
    Panicked {
        /// The hook name that was fired (after alias resolution).
        hook: String,
        /// The extension that registered the handler.
        owner: String,
        /// The panic payload, when it was a string.
        message: String,
    },

    /// The handler was registered for different argument types than the
    /// ones the hook was fired with.
    #[error("handler from `{owner}` on `{hook}` does not accept `{expected}`")]
    TypeMismatch {
        /// The hook name that was fired (after alias resolution).
        hook: String,
        /// The extension that registered the handler.
        owner: String,
        /// The argument types the hook was fired with.
        expected: &'static str,
    },
}

impl HookError {
    /// The extension that owns the failing handler.
    pub fn owner(&self) -> &str {
        match self {
            HookError::Failed { owner, .. }
            | HookError::Panicked { owner, .. }
            | HookError::TypeMismatch { owner, .. } => owner,
        }
    }
}

/// Outcomes of action dispatch that did not produce a result.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No action of that name is reachable on the controller. Protected
    /// names report this too.
    #[error("no action named `{0}`")]
    NotFound(String),

    /// The action exists but refused the caller.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The action ran and failed.
    #[error("action failed")]
    Failed(#[source] BoxError),
}

impl DispatchError {
    /// Returns true for [`DispatchError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, DispatchError::NotFound(_))
    }
}

/// Errors that can occur while loading or saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path:?}")]
    Read {
        /// The file that was read.
        path: PathBuf,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for the expected schema.
    #[error("failed to parse config {origin}")]
    Parse {
        /// Where the text came from (a path or `<string>`).
        origin: String,
        /// The TOML error.
        #[source]
        source: BoxError,
    },

    /// The configuration could not be serialized.
    #[error("failed to serialize config")]
    Serialize(#[source] BoxError),

    /// The configuration file could not be written.
    #[error("failed to write config file {path:?}")]
    Write {
        /// The file that was written.
        path: PathBuf,
        /// The I/O error.
        #[source]
        source: std::io::Error,
    },
}

// Convenience conversions
impl From<BoxError> for LecternError {
    fn from(err: BoxError) -> Self {
        LecternError::Custom(err)
    }
}

impl From<BoxError> for DispatchError {
    fn from(err: BoxError) -> Self {
        DispatchError::Failed(err)
    }
}
