//! # lectern - Route Resolution and Hook Dispatch for Personal Publishing
//!
//! `lectern` is the engine under every request of a small publishing site:
//! it turns a request path into an action plus parameters, dispatches that
//! action on a controller, and lets independently loaded extensions observe
//! and rewrite what happens along the way through named hooks.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lectern::prelude::*;
//!
//! struct MainController;
//!
//! #[controller(output = String)]
//! impl MainController {
//!     pub async fn index(&self, request: &ActionRequest) -> ActionResult<String> {
//!         let title = request.trigger().filter("site_title", "My Blog".to_string());
//!         Ok(title)
//!     }
//! }
//!
//! let engine = EngineBuilder::new(EngineConfig::load("site.toml")?).build()?;
//! let page = engine.handle(&MainController, "/").await?;
//! ```
//!
//! ## Routing precedence
//!
//! 1. Special built-ins: root, feed suffix, `id`, pagination, `archive`,
//!    `search`, `random`.
//! 2. Custom routes from the configuration, first match wins.
//! 3. Routes contributed by extensions, in load order.
//! 4. Content resolvers (the post URL pattern first).

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use lectern_core::{
    // Error types
    BoxError,
    ConfigError,
    // Content lookup
    ContentMatch,
    ContentResolver,
    DEFAULT_PRIORITY,
    DispatchError,
    HookError,
    LecternError,
    // Requests
    Params,
    PatternError,
    Priority,
    RequestPath,
    // Resolution
    Resolution,
    ResolvedRoute,
    UnresolvedRoute,
    decode_component,
};

pub use lectern_std::{
    config::{EngineConfig, RouteConfig},
    content::PostUrlResolver,
    dispatch::{ActionDispatcher, ActionRequest, ActionResult, Controller, Dispatched},
    engine::{Engine, EngineBuilder},
    extension::{Extension, ExtensionKind},
    hooks::{HookAlias, HookHandler, HookRegistry},
    pattern::{CompiledPattern, compile},
    resolver::Resolver,
    routes::{RouteTable, SharedRoutes},
    trigger::{CallReport, Trigger},
    urls::UrlBuilder,
};

#[cfg(feature = "inventory")]
pub use inventory;
#[cfg(feature = "inventory")]
pub use lectern_std::extension::{ExtensionRegistration, collect_extensions};

/// Boxed future returned by controller actions.
pub use futures::future::BoxFuture;

#[cfg(feature = "macros")]
pub use lectern_macros::controller;

/// Route table internals.
pub mod routes {
    pub use lectern_std::routes::{
        ActionTarget, Expansion, RouteEntry, RouteMatch, RouteSource, RouteTable, SharedRoutes,
        SpecialRoute,
    };
}

/// Well-known hook names.
pub mod hooks {
    pub use lectern_std::engine::{ROUTE_DONE_HOOK, RUNTIME_HOOK};
    pub use lectern_std::urls::PARSE_URLS_HOOK;
}

/// Testing utilities.
pub mod testing {
    pub use lectern_std::testing::{CountingHandler, RecordingHandler, StaticContent, StubController};
}

/// Prelude module - common imports for Lectern.
///
/// # Usage
///
/// ```rust,ignore
/// use lectern::prelude::*;
/// ```
pub mod prelude {
    #[cfg(feature = "macros")]
    pub use crate::controller;
    pub use crate::{
        // Dispatch
        ActionRequest,
        ActionResult,
        // Errors
        BoxError,
        Controller,
        DispatchError,
        Dispatched,
        // Bootstrap
        Engine,
        EngineBuilder,
        EngineConfig,
        // Extensions
        Extension,
        HookHandler,
        HookRegistry,
        LecternError,
        Resolution,
        ResolvedRoute,
        RouteTable,
        Trigger,
    };
}
