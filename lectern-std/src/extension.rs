//! # Extensions
//!
//! An extension (a module or a feather) contributes to the engine in three
//! ways:
//!
//! - **Hook handlers**, registered in [`Extension::register`] and removed en
//!   masse when the extension is disabled.
//! - **Clean-URL routes**, returned from [`Extension::routes`] and appended to
//!   the extension collection of the route table in load order.
//! - **Install-time custom routes**, added in [`Extension::install`] when the
//!   extension is first enabled and removed in [`Extension::uninstall`].
//!
//! # Distributed registration
//!
//! With the `inventory` feature, extensions can register themselves from
//! anywhere in the dependency graph:
//!
//! ```rust,ignore
//! inventory::submit! {
//!     ExtensionRegistration::new("comments", || Box::new(Comments::default()))
//! }
//! ```
//!
//! [`collect_extensions`] then builds the ones a configuration enables.

use crate::hooks::HookRegistry;
use crate::routes::RouteTable;
use lectern_core::PatternError;

/// What sort of extension this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtensionKind {
    /// A feature module.
    #[default]
    Module,
    /// A post-type plugin.
    Feather,
}

/// A feather or module loaded into the engine.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not an `Extension`",
    label = "missing `Extension` implementation",
    note = "Extensions must at least implement `name`."
)]
pub trait Extension: Send + Sync {
    /// The unique name, also used as the owner of hooks and routes.
    fn name(&self) -> &str;

    /// Module or feather.
    fn kind(&self) -> ExtensionKind {
        ExtensionKind::Module
    }

    /// Clean-URL routes as `(pattern, expansion)` pairs.
    fn routes(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Register hook handlers and aliases.
    fn register(&self, _hooks: &mut HookRegistry) {}

    /// Add custom routes when the extension is first enabled.
    fn install(&self, _routes: &mut RouteTable) -> Result<(), PatternError> {
        Ok(())
    }

    /// Remove what [`install`](Self::install) added.
    fn uninstall(&self, _routes: &mut RouteTable) {}
}

#[cfg(feature = "inventory")]
pub use collected::{ExtensionRegistration, collect_extensions};

#[cfg(feature = "inventory")]
mod collected {
    use super::Extension;
    use std::sync::Arc;

    /// An extension submitted to the distributed registry.
    pub struct ExtensionRegistration {
        /// The extension name, matched against the enabled lists.
        pub name: &'static str,
        /// Builds a fresh instance.
        pub factory: fn() -> Box<dyn Extension>,
    }

    impl ExtensionRegistration {
        /// Create a registration entry.
        pub const fn new(name: &'static str, factory: fn() -> Box<dyn Extension>) -> Self {
            Self { name, factory }
        }
    }

    inventory::collect!(ExtensionRegistration);

    /// Build the registered extensions named in `enabled`, in that order.
    ///
    /// Names with no registration are logged and skipped.
    pub fn collect_extensions<S: AsRef<str>>(enabled: &[S]) -> Vec<Arc<dyn Extension>> {
        enabled
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                let found = inventory::iter::<ExtensionRegistration>
                    .into_iter()
                    .find(|registration| registration.name == name);
                if found.is_none() {
                    tracing::warn!(extension = name, "enabled extension is not registered");
                }
                found.map(|registration| Arc::from((registration.factory)()))
            })
            .collect()
    }
}
