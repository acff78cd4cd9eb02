#![allow(dead_code)]

use lectern::testing::RecordingHandler;
use lectern::{
    ActionRequest, ActionResult, DispatchError, EngineBuilder, EngineConfig, Extension,
    ExtensionKind, HookRegistry, PatternError, RouteConfig, RouteTable,
};

// ============================================================================
// Tracing
// ============================================================================

/// Route engine logs to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// ============================================================================
// Extensions
// ============================================================================

/// Comment threads: a clean URL per comment, answered by a responder hook.
#[derive(Clone, Default)]
pub struct Comments {
    pub responses: RecordingHandler<ActionRequest>,
}

impl Extension for Comments {
    fn name(&self) -> &str {
        "comments"
    }

    fn routes(&self) -> Vec<(String, String)> {
        vec![("comment/(id)/".into(), "comment".into())]
    }

    fn register(&self, hooks: &mut HookRegistry) {
        hooks.register("main_comment", self.responses.handler(self.name()));
        hooks.on_filter("parse_urls", self.name(), |mut urls: Vec<(String, String)>| {
            urls.push((
                r"^/comment/([0-9]+)/$".into(),
                "/?action=comment&id=${1}".into(),
            ));
            urls
        });
    }
}

/// Categories: an extension route plus an install-time custom route.
#[derive(Clone, Copy, Default)]
pub struct Categorize;

impl Extension for Categorize {
    fn name(&self) -> &str {
        "categorize"
    }

    fn routes(&self) -> Vec<(String, String)> {
        vec![("category/(name)/".into(), "category".into())]
    }

    fn register(&self, hooks: &mut HookRegistry) {
        hooks.on_call("category_feed", self.name(), |_: &ActionRequest| {});
        hooks.on_call("main_category", self.name(), |_: &ActionRequest| {});
    }

    fn install(&self, routes: &mut RouteTable) -> Result<(), PatternError> {
        routes.add_custom("categories/", "category_list")
    }

    fn uninstall(&self, routes: &mut RouteTable) {
        routes.remove_custom("categories/");
    }
}

/// A post-type plugin with no routes of its own.
#[derive(Clone, Copy, Default)]
pub struct TextFeather;

impl Extension for TextFeather {
    fn name(&self) -> &str {
        "text"
    }

    fn kind(&self) -> ExtensionKind {
        ExtensionKind::Feather
    }

    fn register(&self, hooks: &mut HookRegistry) {
        hooks.on_filter("feathers", self.name(), |mut names: Vec<String>| {
            names.push("text".into());
            names
        });
    }
}

// ============================================================================
// Controller
// ============================================================================

#[cfg(feature = "macros")]
pub struct MainController;

#[cfg(feature = "macros")]
#[lectern::controller(output = String, protected = [display])]
impl MainController {
    pub async fn index(&self, request: &ActionRequest) -> ActionResult<String> {
        Ok(format!("index:{}", request.page("page").unwrap_or(1)))
    }

    pub async fn archive(&self, request: &ActionRequest) -> ActionResult<String> {
        let parts: Vec<&str> = ["year", "month", "day"]
            .iter()
            .filter_map(|field| request.param(field))
            .collect();
        Ok(format!("archive:{}", parts.join("-")))
    }

    pub fn search(&self, request: &ActionRequest) -> ActionResult<String> {
        let query = request.param("query").unwrap_or_default().to_string();
        Ok(format!("search:{}", request.trigger().filter("search_query", query)))
    }

    pub fn page(&self, request: &ActionRequest) -> ActionResult<String> {
        Ok(format!("page:{}", request.param("url").unwrap_or_default()))
    }

    pub fn view(&self, request: &ActionRequest) -> ActionResult<String> {
        Ok(format!("view:{}", request.param("url").unwrap_or_default()))
    }

    pub async fn account(&self, _request: &ActionRequest) -> ActionResult<String> {
        Err(DispatchError::Forbidden("not logged in".into()))
    }

    pub fn display(&self, _request: &ActionRequest) -> ActionResult<String> {
        Ok("internal".into())
    }

    pub fn new() -> Self {
        MainController
    }

    fn helper(&self, _request: &ActionRequest) -> ActionResult<String> {
        Ok("private".into())
    }
}

// ============================================================================
// Engines
// ============================================================================

pub fn site_config() -> EngineConfig {
    EngineConfig {
        url: "http://blog.test".into(),
        enabled_modules: vec!["comments".into(), "categorize".into()],
        routes: vec![RouteConfig::new("about/", "page;url=about")],
        ..EngineConfig::default()
    }
}

pub fn site_builder(comments: Comments) -> EngineBuilder {
    EngineBuilder::new(site_config())
        .extension(comments)
        .extension(Categorize)
}
