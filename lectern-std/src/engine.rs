//! # Engine
//!
//! The process-scoped aggregate that owns the route table, the hook registry
//! and the configuration, and runs a request from raw path to dispatched
//! action.
//!
//! # Bootstrap
//!
//! [`EngineBuilder::build`] assembles the engine in a fixed order:
//!
//! 1. persisted custom routes from [`EngineConfig::routes`],
//! 2. for each extension in load order, its hook handlers and its clean-URL
//!    routes,
//! 3. the post URL content resolver, then any user content resolvers.
//!
//! # Request handling
//!
//! [`Engine::handle`] resolves the path, fires `runtime` with the
//! [`ActionRequest`], dispatches the action and, when dispatch succeeds,
//! fires `route_done` with the [`ResolvedRoute`].

use crate::config::{EngineConfig, RouteConfig};
use crate::content::PostUrlResolver;
use crate::dispatch::{ActionDispatcher, ActionRequest, ActionResult, Controller, Dispatched};
use crate::extension::{Extension, ExtensionKind};
use crate::resolver::Resolver;
use crate::routes::{RouteTable, SharedRoutes};
use crate::trigger::{CallReport, Trigger};
use crate::urls::UrlBuilder;
use lectern_core::{
    ConfigError, ContentResolver, DispatchError, LecternError, PatternError, Resolution,
    ResolvedRoute,
};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

/// Fired before every dispatch, with the [`ActionRequest`].
pub const RUNTIME_HOOK: &str = "runtime";

/// Fired after a successful dispatch, with the [`ResolvedRoute`].
pub const ROUTE_DONE_HOOK: &str = "route_done";

/// The expansion the homepage route points at.
pub const HOMEPAGE_EXPANSION: &str = "page;url=home";

/// Builder for constructing an [`Engine`].
pub struct EngineBuilder {
    config: EngineConfig,
    extensions: Vec<Arc<dyn Extension>>,
    content: Vec<Box<dyn ContentResolver>>,
}

impl EngineBuilder {
    /// Start from a configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            extensions: Vec::new(),
            content: Vec::new(),
        }
    }

    /// Load an extension. Extensions load in the order they are added.
    pub fn extension<E: Extension + 'static>(self, extension: E) -> Self {
        self.shared_extension(Arc::new(extension))
    }

    /// Load an already shared extension.
    pub fn shared_extension(mut self, extension: Arc<dyn Extension>) -> Self {
        if self.extensions.iter().any(|e| e.name() == extension.name()) {
            tracing::warn!(extension = extension.name(), "extension loaded twice, ignoring");
        } else {
            self.extensions.push(extension);
        }
        self
    }

    /// Add a content resolver, consulted after the post URL resolver.
    pub fn content<C: ContentResolver + 'static>(mut self, content: C) -> Self {
        self.content.push(Box::new(content));
        self
    }

    /// Load the registered extensions named in the configuration's enabled
    /// modules and feathers.
    #[cfg(feature = "inventory")]
    pub fn collected_extensions(self) -> Self {
        let enabled: Vec<String> = self.config.enabled_extensions().map(String::from).collect();
        crate::extension::collect_extensions(&enabled)
            .into_iter()
            .fold(self, Self::shared_extension)
    }

    /// Build the engine.
    pub fn build(self) -> Result<Engine, LecternError> {
        let mut routes = RouteTable::new();
        for route in &self.config.routes {
            routes.add_custom(&route.pattern, &route.action)?;
        }

        let trigger = Trigger::new();
        for extension in &self.extensions {
            trigger.update(|hooks| extension.register(hooks));
            routes.contribute(extension.name(), extension.routes())?;
            tracing::debug!(extension = extension.name(), "extension loaded");
        }

        let mut resolver = Resolver::new().with_content(PostUrlResolver::new(&self.config.post_url)?);
        for content in self.content {
            resolver.push_boxed(content);
        }

        let urls = UrlBuilder::new(&self.config.url, self.config.clean_urls, trigger.clone());
        tracing::info!(
            routes = routes.len(),
            extensions = self.extensions.len(),
            "engine ready"
        );

        Ok(Engine {
            config: RwLock::new(self.config),
            routes: Arc::new(RwLock::new(routes)),
            dispatcher: ActionDispatcher::new(trigger.clone()),
            trigger,
            resolver,
            urls,
            extensions: RwLock::new(self.extensions),
        })
    }
}

/// The route-resolution and hook-dispatch engine.
///
/// # Example
///
/// ```rust
/// use lectern_std::config::EngineConfig;
/// use lectern_std::engine::EngineBuilder;
///
/// let engine = EngineBuilder::new(EngineConfig::default()).build().unwrap();
/// engine.enable_homepage().unwrap();
///
/// let home = engine.resolve("/").into_resolved().unwrap();
/// assert_eq!(home.action, "page");
/// assert!(engine.config().enable_homepage());
/// ```
pub struct Engine {
    config: RwLock<EngineConfig>,
    routes: SharedRoutes,
    trigger: Trigger,
    resolver: Resolver,
    dispatcher: ActionDispatcher,
    urls: UrlBuilder,
    extensions: RwLock<Vec<Arc<dyn Extension>>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let routes = self.routes.read().len();
        f.debug_struct("Engine")
            .field("routes", &routes)
            .field("extensions", &self.extension_names())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Resolve a raw request path.
    pub fn resolve(&self, raw: &str) -> Resolution {
        self.resolver.resolve(&self.routes.read(), raw)
    }

    /// Resolve and dispatch a request on `controller`.
    ///
    /// An unresolved path is reported as [`DispatchError::NotFound`] carrying
    /// the normalized request.
    pub async fn handle<C: Controller + ?Sized>(
        &self,
        controller: &C,
        raw: &str,
    ) -> ActionResult<Dispatched<C::Output>> {
        let route = match self.resolve(raw) {
            Resolution::Resolved(route) => route,
            Resolution::Unresolved(unresolved) => {
                return Err(DispatchError::NotFound(unresolved.request));
            }
        };

        let request = ActionRequest::new(&route, self.trigger.clone());
        self.notify(RUNTIME_HOOK, &request);

        let result = self.dispatcher.dispatch_request(controller, request).await;
        if result.is_ok() {
            self.notify(ROUTE_DONE_HOOK, &route);
        }
        result
    }

    /// Fire a lifecycle hook whose failures must not affect the request.
    fn notify<A: 'static>(&self, hook: &str, args: &A) {
        let report = self.trigger.call(hook, args);
        if !report.is_clean() {
            tracing::debug!(
                hook = %report.hook,
                invoked = report.invoked,
                failed = report.failures.len(),
                "lifecycle hook finished with failures"
            );
        }
    }

    /// Add or replace a custom route, keeping the configuration in step.
    pub fn add_route(&self, pattern: &str, expansion: &str) -> Result<(), PatternError> {
        self.routes.write().add_custom(pattern, expansion)?;
        self.sync_routes();
        Ok(())
    }

    /// Remove a custom route. Removing an absent route is a no-op.
    pub fn remove_route(&self, pattern: &str) -> bool {
        let removed = self.routes.write().remove_custom(pattern);
        if removed {
            self.sync_routes();
        }
        removed
    }

    /// Serve the home page at the site root.
    pub fn enable_homepage(&self) -> Result<(), PatternError> {
        self.add_route("/", HOMEPAGE_EXPANSION)
    }

    /// Serve the index at the site root again.
    pub fn disable_homepage(&self) -> bool {
        self.remove_route("/")
    }

    fn sync_routes(&self) {
        let routes: Vec<RouteConfig> = self
            .routes
            .read()
            .custom_routes()
            .map(|entry| RouteConfig::new(entry.pattern().source(), entry.expansion().raw()))
            .collect();
        self.config.write().routes = routes;
    }

    /// Enable an extension at runtime: contribute its routes, run its
    /// install step and register its hooks.
    ///
    /// Enabling an extension that is already loaded does nothing. If route
    /// contribution or the install step fails, the route table is left as it
    /// was before the call.
    ///
    /// Locks are taken in the order extensions, routes, hooks, config.
    pub fn enable_extension(&self, extension: Arc<dyn Extension>) -> Result<(), PatternError> {
        let name = extension.name().to_string();
        let mut extensions = self.extensions.write();
        if extensions.iter().any(|e| e.name() == name) {
            tracing::debug!(extension = %name, "extension already enabled");
            return Ok(());
        }

        {
            let mut routes = self.routes.write();
            let before = routes.clone();
            let staged = routes
                .contribute(&name, extension.routes())
                .and_then(|_| extension.install(&mut routes));
            if let Err(err) = staged {
                *routes = before;
                tracing::warn!(extension = %name, error = %err, "extension install failed");
                return Err(err);
            }
        }
        self.trigger.update(|hooks| extension.register(hooks));

        {
            let mut config = self.config.write();
            let list = match extension.kind() {
                ExtensionKind::Module => &mut config.enabled_modules,
                ExtensionKind::Feather => &mut config.enabled_feathers,
            };
            if !list.contains(&name) {
                list.push(name.clone());
            }
        }
        extensions.push(extension);
        self.sync_routes();
        drop(extensions);

        tracing::info!(extension = %name, "extension enabled");
        Ok(())
    }

    /// Disable an extension: uninstall its routes, withdraw its route
    /// contributions and unregister its hooks and aliases.
    ///
    /// Returns false if no extension of that name is loaded.
    pub fn disable_extension(&self, name: &str) -> bool {
        let mut extensions = self.extensions.write();
        let extension = match extensions.iter().position(|e| e.name() == name) {
            Some(index) => extensions.remove(index),
            None => return false,
        };

        {
            let mut routes = self.routes.write();
            extension.uninstall(&mut routes);
            routes.withdraw(name);
        }
        let removed = self.trigger.update(|hooks| hooks.unregister_owner(name));

        {
            let mut config = self.config.write();
            config.enabled_modules.retain(|m| m != name);
            config.enabled_feathers.retain(|f| f != name);
        }
        self.sync_routes();
        drop(extensions);

        tracing::info!(extension = name, handlers = removed, "extension disabled");
        true
    }

    /// Names of the loaded extensions, in load order.
    pub fn extension_names(&self) -> Vec<String> {
        self.extensions
            .read()
            .iter()
            .map(|e| e.name().to_string())
            .collect()
    }

    /// Build a link for a clean path.
    pub fn url(&self, path: &str) -> String {
        self.urls.url(path)
    }

    /// How many items a listing for `route` should show.
    pub fn item_limit(&self, route: &ResolvedRoute) -> usize {
        let config = self.config.read();
        if route.is_feed {
            config.feed_items
        } else {
            config.posts_per_page
        }
    }

    /// Let an extension serve `route` as a feed.
    ///
    /// Returns `None` unless a feed was requested and some extension handles
    /// the route's feed hook; otherwise the report of that call.
    pub fn serve_feed<A: 'static>(&self, route: &ResolvedRoute, context: &A) -> Option<CallReport> {
        if !route.is_feed {
            return None;
        }
        let hook = route.feed_hook();
        self.trigger
            .has_callers(&hook)
            .then(|| self.trigger.call(&hook, context))
    }

    /// A snapshot of the current configuration.
    pub fn config(&self) -> EngineConfig {
        self.config.read().clone()
    }

    /// Write the current configuration to a TOML file.
    pub fn save_config(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        self.config.read().save(path)
    }

    /// The shared route table.
    pub fn routes(&self) -> &SharedRoutes {
        &self.routes
    }

    /// The hook API.
    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// The action dispatcher.
    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{HookHandler, HookRegistry};
    use crate::testing::StubController;
    use lectern_core::BoxError;
    use std::time::Duration;

    struct Categorize;

    impl Extension for Categorize {
        fn name(&self) -> &str {
            "categorize"
        }

        fn routes(&self) -> Vec<(String, String)> {
            vec![("category/(name)/".into(), "category".into())]
        }

        fn register(&self, hooks: &mut HookRegistry) {
            hooks.on_call("category_feed", self.name(), |_: &()| {});
            hooks.alias_for(self.name(), "tag_feed", "category_feed");
        }

        fn install(&self, routes: &mut RouteTable) -> Result<(), PatternError> {
            routes.add_custom("categories/", "category_list")
        }

        fn uninstall(&self, routes: &mut RouteTable) {
            routes.remove_custom("categories/");
        }
    }

    fn engine() -> Engine {
        EngineBuilder::new(EngineConfig::default()).build().unwrap()
    }

    struct Slow;

    impl Extension for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        fn routes(&self) -> Vec<(String, String)> {
            std::thread::sleep(Duration::from_millis(100));
            vec![("slow/".into(), "slow".into())]
        }

        fn register(&self, hooks: &mut HookRegistry) {
            hooks.on_call("slow_hook", self.name(), |_: &()| {});
        }
    }

    /// Installs one route, then fails on the second.
    struct HalfInstalled;

    impl Extension for HalfInstalled {
        fn name(&self) -> &str {
            "tags"
        }

        fn routes(&self) -> Vec<(String, String)> {
            vec![("tag/(name)/".into(), "tag".into())]
        }

        fn register(&self, hooks: &mut HookRegistry) {
            hooks.on_call("tag_feed", self.name(), |_: &()| {});
        }

        fn install(&self, routes: &mut RouteTable) -> Result<(), PatternError> {
            routes.add_custom("tags/", "tag_cloud")?;
            routes.add_custom("bad/(a)/(a)/", "bad")
        }
    }

    #[test]
    fn test_build_loads_persisted_routes() {
        let mut config = EngineConfig::default();
        config.routes.push(RouteConfig::new("/", HOMEPAGE_EXPANSION));
        config.routes.push(RouteConfig::new("about/", "page;url=about"));
        let engine = EngineBuilder::new(config).build().unwrap();

        assert_eq!(engine.resolve("/").action(), Some("page"));
        assert_eq!(
            engine.resolve("/about/").as_resolved().and_then(|r| r.param("url")),
            Some("about")
        );
    }

    #[test]
    fn test_build_rejects_bad_routes() {
        let mut config = EngineConfig::default();
        config.routes.push(RouteConfig::new("(id)/(id)/", "x"));
        let err = EngineBuilder::new(config).build().unwrap_err();
        assert!(matches!(err, LecternError::Pattern(PatternError::DuplicatePlaceholder { .. })));
    }

    #[test]
    fn test_post_url_fallback() {
        let route = engine().resolve("/2020/07/04/hello/").into_resolved().unwrap();
        assert_eq!(route.action, "view");
        assert_eq!(route.param("url"), Some("hello"));
    }

    #[test]
    fn test_route_mutations_sync_config() {
        let engine = engine();
        engine.add_route("comment/(id)/", "comment").unwrap();
        assert_eq!(engine.config().routes, [RouteConfig::new("comment/(id)/", "comment")]);

        assert!(engine.remove_route("comment/(id)/"));
        assert!(!engine.remove_route("comment/(id)/"));
        assert!(engine.config().routes.is_empty());
    }

    #[test]
    fn test_homepage_toggle() {
        let engine = engine();
        engine.enable_homepage().unwrap();
        assert!(engine.config().enable_homepage());
        assert_eq!(engine.resolve("/").action(), Some("page"));

        assert!(engine.disable_homepage());
        assert!(!engine.config().enable_homepage());
        assert_eq!(engine.resolve("/").action(), Some("index"));
    }

    #[test]
    fn test_extension_lifecycle() {
        let engine = engine();
        engine.enable_extension(Arc::new(Categorize)).unwrap();
        engine.enable_extension(Arc::new(Categorize)).unwrap();

        assert_eq!(engine.extension_names(), ["categorize"]);
        assert_eq!(engine.config().enabled_modules, ["categorize"]);
        assert_eq!(engine.resolve("/category/rust/").action(), Some("category"));
        assert_eq!(engine.resolve("/categories/").action(), Some("category_list"));
        assert!(engine.trigger().exists("tag_feed"));

        assert!(engine.disable_extension("categorize"));
        assert!(!engine.disable_extension("categorize"));
        assert!(!engine.resolve("/category/rust/").is_resolved());
        assert!(!engine.resolve("/categories/").is_resolved());
        assert!(!engine.trigger().exists("category_feed"));
        assert!(engine.trigger().read(|hooks| hooks.alias_of("tag_feed").is_none()));
        assert!(engine.config().enabled_modules.is_empty());
        assert!(engine.config().routes.is_empty());
    }

    #[test]
    fn test_feed_helpers() {
        let engine = EngineBuilder::new(EngineConfig::default())
            .extension(Categorize)
            .build()
            .unwrap();

        let feed = engine.resolve("/category/rust/feed/").into_resolved().unwrap();
        assert!(feed.is_feed);
        assert_eq!(engine.item_limit(&feed), 20);
        assert!(engine.serve_feed(&feed, &()).is_some_and(|r| r.handled()));

        let listing = engine.resolve("/category/rust/").into_resolved().unwrap();
        assert_eq!(engine.item_limit(&listing), 10);
        assert!(engine.serve_feed(&listing, &()).is_none());

        let index_feed = engine.resolve("/feed/").into_resolved().unwrap();
        assert!(engine.serve_feed(&index_feed, &()).is_none());
    }

    #[test]
    fn test_urls_follow_config() {
        let config = EngineConfig {
            url: "http://blog.test".into(),
            clean_urls: false,
            ..EngineConfig::default()
        };
        let engine = EngineBuilder::new(config).build().unwrap();
        assert_eq!(engine.url("search/rust/"), "http://blog.test/?action=search&query=rust");
    }

    #[test]
    fn test_concurrent_enable_loads_once() {
        let engine = engine();
        let slow: Arc<dyn Extension> = Arc::new(Slow);

        std::thread::scope(|scope| {
            for _ in 0..2 {
                let slow = slow.clone();
                let engine = &engine;
                scope.spawn(move || engine.enable_extension(slow).unwrap());
            }
        });

        assert_eq!(engine.extension_names(), ["slow"]);
        assert_eq!(engine.trigger().read(|hooks| hooks.handlers("slow_hook").len()), 1);
        assert_eq!(engine.routes().read().extension_routes().count(), 1);
    }

    #[test]
    fn test_failed_install_leaves_routes_untouched() {
        let engine = engine();
        engine.add_route("about/", "page;url=about").unwrap();

        let err = engine.enable_extension(Arc::new(HalfInstalled)).unwrap_err();
        assert!(matches!(err, PatternError::DuplicatePlaceholder { .. }));

        assert!(!engine.resolve("/tags/").is_resolved());
        assert!(!engine.resolve("/tag/rust/").is_resolved());
        assert_eq!(engine.resolve("/about/").action(), Some("page"));
        assert_eq!(engine.routes().read().len(), 1);
        assert!(engine.extension_names().is_empty());
        assert!(!engine.trigger().exists("tag_feed"));
        assert!(engine.config().enabled_modules.is_empty());
        assert_eq!(engine.config().routes, [RouteConfig::new("about/", "page;url=about")]);
    }

    #[test]
    fn test_feed_filters_do_not_serve_feeds() {
        let engine = engine();
        engine.add_route("category/(name)/", "category").unwrap();
        engine
            .trigger()
            .update(|hooks| hooks.on_filter("category_feed", "ext", |title: String| title));

        let feed = engine.resolve("/category/rust/feed/").into_resolved().unwrap();
        assert!(engine.trigger().exists("category_feed"));
        assert!(engine.serve_feed(&feed, &()).is_none());
    }

    #[tokio::test]
    async fn test_failing_lifecycle_hooks_do_not_fail_requests() {
        let engine = engine();
        engine.trigger().update(|hooks| {
            hooks.register(
                RUNTIME_HOOK,
                HookHandler::call("audit", |_: &ActionRequest| -> Result<(), BoxError> {
                    Err("audit log offline".into())
                }),
            );
            hooks.register(
                ROUTE_DONE_HOOK,
                HookHandler::call("audit", |_: &ResolvedRoute| -> Result<(), BoxError> {
                    panic!("late")
                }),
            );
        });
        let controller = StubController::new("main").with_action("index", "home");

        let outcome = engine.handle(&controller, "/").await.unwrap();
        assert_eq!(outcome.into_output().as_deref(), Some("home"));
        assert_eq!(controller.invoked().len(), 1);
    }
}
