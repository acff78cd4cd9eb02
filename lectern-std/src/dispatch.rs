//! # Action Dispatch
//!
//! Maps a resolved action name to a method on a [`Controller`].
//!
//! Lookup order for an action `a` on a controller named `c`:
//!
//! 1. `a` is protected: [`DispatchError::NotFound`], with no further lookup.
//! 2. The controller has an action `a`: it runs and its output is returned as
//!    [`Dispatched::Action`].
//! 3. Some extension has a call handler on the responder hook `c_a`: the hook is called
//!    with the [`ActionRequest`] and the result is [`Dispatched::Hook`].
//! 4. Otherwise [`DispatchError::NotFound`].
//!
//! Authorization is left to the action itself, which may return
//! [`DispatchError::Forbidden`].

use crate::trigger::{CallReport, Trigger};
use futures::future::BoxFuture;
use lectern_core::{DispatchError, Params, ResolvedRoute};

pub use lectern_core::RESERVED_ACTIONS;

/// The result of running an action.
pub type ActionResult<T> = Result<T, DispatchError>;

/// The request-scoped view an action receives.
///
/// Parameters start as a copy of the resolved route's and may be changed by
/// the action without touching the route itself.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    action: String,
    params: Params,
    is_feed: bool,
    trigger: Trigger,
}

impl ActionRequest {
    /// Build a request from a resolved route.
    pub fn new(route: &ResolvedRoute, trigger: Trigger) -> Self {
        Self {
            action: route.action.clone(),
            params: route.params.clone(),
            is_feed: route.is_feed,
            trigger,
        }
    }

    /// The action being dispatched.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The request parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Look up a parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Look up a pagination parameter as a number.
    pub fn page(&self, name: &str) -> Option<u64> {
        self.param(name).and_then(|value| value.parse().ok())
    }

    /// Mutable access to the parameters.
    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Set a parameter, returning the previous value.
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.params.insert(name.into(), value.into())
    }

    /// Whether a feed was requested.
    pub fn is_feed(&self) -> bool {
        self.is_feed
    }

    /// The hook API, for firing extension points from action bodies.
    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }
}

/// An object whose methods are reachable as actions.
///
/// Usually generated with the `#[controller]` attribute; a manual
/// implementation matches on the action name in [`invoke`](Self::invoke).
///
/// # Example
///
/// ```rust
/// use lectern_std::dispatch::{ActionRequest, ActionResult, Controller};
/// use futures::future::BoxFuture;
///
/// struct Admin;
///
/// impl Controller for Admin {
///     type Output = String;
///
///     fn name(&self) -> &str {
///         "admin"
///     }
///
///     fn actions(&self) -> &[&'static str] {
///         &["settings"]
///     }
///
///     fn invoke<'a>(
///         &'a self,
///         action: &str,
///         _request: &'a ActionRequest,
///     ) -> Option<BoxFuture<'a, ActionResult<String>>> {
///         match action {
///             "settings" => Some(Box::pin(async { Ok("settings".to_string()) })),
///             _ => None,
///         }
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Controller`",
    label = "missing `Controller` implementation",
    note = "Annotate the impl block with `#[controller]`, or implement `Controller` by hand."
)]
pub trait Controller: Send + Sync {
    /// What every action produces.
    type Output: Send;

    /// The controller name, used for responder hooks (`<name>_<action>`).
    fn name(&self) -> &str;

    /// The actions this controller exposes.
    fn actions(&self) -> &[&'static str];

    /// Names that must never be reachable as actions.
    fn protected(&self) -> &[&'static str] {
        &[]
    }

    /// Whether `action` is one of [`actions`](Self::actions).
    fn has_action(&self, action: &str) -> bool {
        self.actions().iter().any(|a| *a == action)
    }

    /// Start the action, or return `None` if there is no such action.
    fn invoke<'a>(
        &'a self,
        action: &str,
        request: &'a ActionRequest,
    ) -> Option<BoxFuture<'a, ActionResult<Self::Output>>>;
}

/// Who answered a dispatched action.
#[derive(Debug)]
pub enum Dispatched<T> {
    /// The controller's own action ran.
    Action(T),
    /// An extension's responder hook ran.
    Hook(CallReport),
}

impl<T> Dispatched<T> {
    /// The controller output, if the controller answered.
    pub fn into_output(self) -> Option<T> {
        match self {
            Dispatched::Action(output) => Some(output),
            Dispatched::Hook(_) => None,
        }
    }
}

/// Dispatches resolved routes to controllers and responder hooks.
#[derive(Debug, Clone, Default)]
pub struct ActionDispatcher {
    trigger: Trigger,
}

impl ActionDispatcher {
    /// Create a dispatcher firing responder hooks through `trigger`.
    pub fn new(trigger: Trigger) -> Self {
        Self { trigger }
    }

    /// Whether `action` is unreachable on `controller`.
    ///
    /// Reserved names, names starting with `_` and the controller's own
    /// protected list are all protected.
    pub fn is_protected<C: Controller + ?Sized>(controller: &C, action: &str) -> bool {
        action.starts_with('_')
            || RESERVED_ACTIONS.iter().any(|r| *r == action)
            || controller.protected().iter().any(|p| *p == action)
    }

    /// The responder hook an extension registers to answer `action`.
    pub fn responder_hook<C: Controller + ?Sized>(controller: &C, action: &str) -> String {
        format!("{}_{}", controller.name(), action)
    }

    /// Dispatch a resolved route.
    pub async fn dispatch<C: Controller + ?Sized>(
        &self,
        controller: &C,
        route: &ResolvedRoute,
    ) -> ActionResult<Dispatched<C::Output>> {
        self.dispatch_request(controller, ActionRequest::new(route, self.trigger.clone()))
            .await
    }

    /// Dispatch a prepared request.
    pub async fn dispatch_request<C: Controller + ?Sized>(
        &self,
        controller: &C,
        request: ActionRequest,
    ) -> ActionResult<Dispatched<C::Output>> {
        let action = request.action();

        if Self::is_protected(controller, action) {
            tracing::debug!(controller = controller.name(), action, "protected action refused");
            return Err(DispatchError::NotFound(action.to_string()));
        }

        if let Some(future) = controller.invoke(action, &request) {
            tracing::debug!(controller = controller.name(), action, "dispatching action");
            return future.await.map(Dispatched::Action);
        }

        let hook = Self::responder_hook(controller, action);
        if self.trigger.has_callers(&hook) {
            tracing::debug!(hook = %hook, "dispatching to responder hook");
            return Ok(Dispatched::Hook(self.trigger.call(&hook, &request)));
        }

        Err(DispatchError::NotFound(action.to_string()))
    }
}
