//! # lectern-core
//!
//! Core types for the Lectern route-resolution and hook-dispatch engine.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! extensions and collaborators (content lookup, persistence, rendering) that
//! only need to speak the engine's vocabulary, not run it.
//!
//! # Request Lifecycle
//!
//! 1. A raw path becomes a [`RequestPath`].
//! 2. The resolver turns it into a [`Resolution`]: either a [`ResolvedRoute`]
//!    (action + [`Params`] + feed flag) or an [`UnresolvedRoute`].
//! 3. When nothing built in claims the path, [`ContentResolver`]s get the last
//!    word.
//! 4. The action is dispatched on a controller; handler bodies fire hooks.
//!
//! # Error Types
//!
//! - [`LecternError`] - Top-level error type
//! - [`PatternError`] - Route pattern compilation errors
//! - [`HookError`] - Isolated hook handler failures
//! - [`DispatchError`] - Action dispatch outcomes
//! - [`ConfigError`] - Configuration loading and saving

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod content;
mod error;
mod request;
mod route;

// Re-exports
pub use content::{ContentMatch, ContentResolver};
pub use error::{BoxError, ConfigError, DispatchError, HookError, LecternError, PatternError};
pub use request::{Params, RequestPath, decode_component};
pub use route::{Resolution, ResolvedRoute, UnresolvedRoute};

/// Hook handler priority. Lower values run first.
pub type Priority = i32;

/// The priority handlers get when none is given.
pub const DEFAULT_PRIORITY: Priority = 10;

/// Names no controller may expose as actions.
///
/// `#[controller]` rejects them at compile time and the dispatcher refuses
/// them at run time.
pub const RESERVED_ACTIONS: &[&str] = &["new", "invoke", "name", "actions", "protected", "has_action"];
