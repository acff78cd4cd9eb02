//! Controllers generated by `#[controller]` and dispatch through the engine.

#![cfg(feature = "macros")]

mod common;

use common::{Comments, MainController, init_tracing, site_builder};
use lectern::hooks::{ROUTE_DONE_HOOK, RUNTIME_HOOK};
use lectern::testing::RecordingHandler;
use lectern::{
    ActionRequest, ActionResult, Controller, DispatchError, Dispatched, Engine, ResolvedRoute,
};

fn site(comments: Comments) -> Engine {
    init_tracing();
    site_builder(comments).build().unwrap()
}

async fn output(engine: &Engine, raw: &str) -> String {
    engine
        .handle(&MainController, raw)
        .await
        .unwrap_or_else(|err| panic!("{raw}: {err}"))
        .into_output()
        .unwrap_or_else(|| panic!("{raw} was answered by a hook"))
}

// ============================================================================
// Generated controller
// ============================================================================

#[test]
fn test_generated_action_table() {
    let main = MainController::new();
    assert_eq!(main.name(), "main");
    assert_eq!(
        main.actions(),
        ["index", "archive", "search", "page", "view", "account"]
    );
    assert_eq!(main.protected(), ["display"]);
    assert!(!main.has_action("helper"));
    assert!(!main.has_action("new"));
}

struct FeedController;

#[lectern::controller(name = "feeds")]
impl FeedController {
    pub fn atom(&self, request: &ActionRequest) -> ActionResult<usize> {
        Ok(request.params().len())
    }
}

struct AdminController;

#[lectern::controller(output = ())]
impl AdminController {
    pub async fn settings(&self, _request: &ActionRequest) -> ActionResult<()> {
        Ok(())
    }
}

#[test]
fn test_names_and_inferred_output() {
    assert_eq!(FeedController.name(), "feeds");
    assert_eq!(FeedController.actions(), ["atom"]);
    assert_eq!(AdminController.name(), "admin");
}

// ============================================================================
// Engine dispatch
// ============================================================================

#[tokio::test]
async fn test_handle_dispatches_resolved_actions() {
    let engine = site(Comments::default());

    assert_eq!(output(&engine, "/").await, "index:1");
    assert_eq!(output(&engine, "/page/3/").await, "index:3");
    assert_eq!(output(&engine, "/archive/2020/07/").await, "archive:2020-07");
    assert_eq!(output(&engine, "/about/").await, "page:about");
    assert_eq!(output(&engine, "/2020/07/04/hello/").await, "view:hello");
}

#[tokio::test]
async fn test_actions_reach_extension_filters() {
    let engine = site(Comments::default());
    engine
        .trigger()
        .update(|hooks| hooks.on_filter("search_query", "spellcheck", |q: String| q.replace("rsut", "rust")));

    assert_eq!(output(&engine, "/search/rsut/").await, "search:rust");
}

#[tokio::test]
async fn test_protected_and_unknown_actions_are_not_found() {
    let engine = site(Comments::default());
    engine.add_route("internal/", "display").unwrap();
    engine.add_route("missing/", "nothing").unwrap();

    for raw in ["/internal/", "/missing/", "/no/such/path/"] {
        let err = engine.handle(&MainController, raw).await.unwrap_err();
        assert!(err.is_not_found(), "{raw} should be not found, got {err}");
    }
}

#[tokio::test]
async fn test_actions_may_refuse() {
    let engine = site(Comments::default());
    engine.add_route("account/", "account").unwrap();

    let err = engine.handle(&MainController, "/account/").await.unwrap_err();
    assert!(matches!(err, DispatchError::Forbidden(_)));
}

#[tokio::test]
async fn test_extension_responder_hook() {
    let comments = Comments::default();
    let engine = site(comments.clone());

    let outcome = engine.handle(&MainController, "/comment/42/").await.unwrap();
    assert!(matches!(outcome, Dispatched::Hook(ref report) if report.handled()));

    let requests = comments.responses.calls();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].action(), "comment");
    assert_eq!(requests[0].param("id"), Some("42"));
}

#[tokio::test]
async fn test_runtime_and_route_done_hooks() {
    let engine = site(Comments::default());
    let runtime = RecordingHandler::<ActionRequest>::new();
    let done = RecordingHandler::<ResolvedRoute>::new();
    engine.trigger().update(|hooks| {
        hooks.register(RUNTIME_HOOK, runtime.handler("audit"));
        hooks.register(ROUTE_DONE_HOOK, done.handler("audit"));
    });

    output(&engine, "/archive/2021/").await;
    assert_eq!(runtime.count(), 1);
    assert_eq!(done.calls()[0].action, "archive");

    let _ = engine.handle(&MainController, "/nowhere/").await;
    assert_eq!(runtime.count(), 1);

    engine.add_route("account/", "account").unwrap();
    let _ = engine.handle(&MainController, "/account/").await;
    assert_eq!(runtime.count(), 2);
    assert_eq!(done.count(), 1);
}
