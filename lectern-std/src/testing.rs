//! Testing utilities for Lectern.
//!
//! Doubles for the engine's seams, so extensions and collaborators can be
//! tested without a full site.
//!
//! # Features
//!
//! - [`RecordingHandler`]: A hook handler that records the arguments it receives
//! - [`CountingHandler`]: A hook handler that counts invocations
//! - [`StubController`]: A controller with canned action outputs
//! - [`StaticContent`]: A content resolver backed by a fixed path map

use crate::dispatch::{ActionRequest, ActionResult, Controller};
use crate::hooks::HookHandler;
use futures::future::BoxFuture;
use lectern_core::{ContentMatch, ContentResolver, Params, RequestPath};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Recording Handler
// ============================================================================

/// A call handler that records a clone of every argument it receives.
///
/// # Example
///
/// ```rust
/// use lectern_std::testing::RecordingHandler;
/// use lectern_std::trigger::Trigger;
///
/// let recorder = RecordingHandler::<String>::new();
/// let trigger = Trigger::new();
/// trigger.update(|hooks| hooks.register("publish", recorder.handler("test")));
///
/// let _ = trigger.call("publish", &"hello".to_string());
/// assert_eq!(recorder.calls(), ["hello"]);
/// ```
pub struct RecordingHandler<A: Clone> {
    calls: Arc<Mutex<Vec<A>>>,
}

impl<A: Clone + Send + 'static> RecordingHandler<A> {
    /// Create a new recorder.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A hook handler owned by `owner` that feeds this recorder.
    pub fn handler(&self, owner: &str) -> HookHandler {
        let calls = self.calls.clone();
        HookHandler::call(owner, move |args: &A| {
            calls.lock().push(args.clone());
            Ok(())
        })
    }

    /// Get a clone of the recorded arguments.
    pub fn calls(&self) -> Vec<A> {
        self.calls.lock().clone()
    }

    /// Get the number of recorded calls.
    pub fn count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Clear all recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

impl<A: Clone + Send + 'static> Default for RecordingHandler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Clone> Clone for RecordingHandler<A> {
    fn clone(&self) -> Self {
        Self {
            calls: self.calls.clone(),
        }
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A handler that counts invocations.
#[derive(Clone, Default)]
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Create a new counting handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// A call handler for arguments of type `A`.
    pub fn handler<A: 'static>(&self, owner: &str) -> HookHandler {
        let count = self.count.clone();
        HookHandler::call(owner, move |_: &A| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

// ============================================================================
// Stub Controller
// ============================================================================

/// A controller whose actions return canned strings.
///
/// Every invocation is recorded with the request parameters it received.
#[derive(Clone)]
pub struct StubController {
    name: String,
    actions: Vec<&'static str>,
    protected: Vec<&'static str>,
    outputs: HashMap<&'static str, String>,
    invoked: Arc<Mutex<Vec<(String, Params)>>>,
}

impl StubController {
    /// Create a controller with no actions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
            protected: Vec::new(),
            outputs: HashMap::new(),
            invoked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add an action returning `output`.
    pub fn with_action(mut self, action: &'static str, output: impl Into<String>) -> Self {
        self.actions.push(action);
        self.outputs.insert(action, output.into());
        self
    }

    /// Mark an action protected.
    pub fn with_protected(mut self, action: &'static str) -> Self {
        self.protected.push(action);
        self
    }

    /// The actions invoked so far, with their parameters.
    pub fn invoked(&self) -> Vec<(String, Params)> {
        self.invoked.lock().clone()
    }
}

impl Controller for StubController {
    type Output = String;

    fn name(&self) -> &str {
        &self.name
    }

    fn actions(&self) -> &[&'static str] {
        &self.actions
    }

    fn protected(&self) -> &[&'static str] {
        &self.protected
    }

    fn invoke<'a>(
        &'a self,
        action: &str,
        request: &'a ActionRequest,
    ) -> Option<BoxFuture<'a, ActionResult<String>>> {
        let output = self.outputs.get(action)?.clone();
        self.invoked
            .lock()
            .push((action.to_string(), request.params().clone()));
        Some(Box::pin(async move { Ok(output) }))
    }
}

// ============================================================================
// Static Content
// ============================================================================

/// A content resolver answering from a fixed map of request paths.
///
/// Paths are compared after normalization, so `about/` and `/about/` name
/// the same entry.
#[derive(Debug, Clone, Default)]
pub struct StaticContent {
    entries: HashMap<String, ContentMatch>,
}

impl StaticContent {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `path` with `found`.
    pub fn with(mut self, path: &str, found: ContentMatch) -> Self {
        self.entries
            .insert(RequestPath::parse(path).request().to_string(), found);
        self
    }
}

impl ContentResolver for StaticContent {
    fn resolve_content(&self, path: &RequestPath, _params: &Params) -> Option<ContentMatch> {
        self.entries.get(path.request()).cloned()
    }
}
