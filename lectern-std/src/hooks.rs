//! # Hook Registry
//!
//! Maps hook names to priority-ordered handler lists and records single-hop
//! aliases between names.
//!
//! Handlers are type-erased: a call handler for arguments `A` and a filter
//! handler for value `V` and arguments `A` are stored behind `dyn Any` and
//! downcast when fired. Firing a hook with types that do not match a
//! handler's registration reports a [`HookError::TypeMismatch`] for that
//! handler instead of invoking it.
//!
//! # Alias semantics
//!
//! Aliases are single-hop: firing `from` runs exactly the handler list of
//! `to`. Handlers registered directly on an aliased name are kept but stay
//! dormant until the alias is removed.
//!
//! [`HookError::TypeMismatch`]: lectern_core::HookError::TypeMismatch

use lectern_core::{BoxError, DEFAULT_PRIORITY, Priority};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub(crate) type CallFn<A> = Box<dyn Fn(&A) -> Result<(), BoxError> + Send + Sync>;
pub(crate) type FilterFn<V, A> = Box<dyn Fn(V, &A) -> Result<V, BoxError> + Send + Sync>;

/// Whether a handler observes a hook or transforms a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Fired by `call`; the return value is discarded.
    Call,
    /// Fired by `filter`; receives and returns the threaded value.
    Filter,
}

/// A registered hook handler: owner, priority and the type-erased callable.
#[derive(Clone)]
pub struct HookHandler {
    owner: Arc<str>,
    priority: Priority,
    kind: HandlerKind,
    signature: &'static str,
    callable: Arc<dyn Any + Send + Sync>,
}

impl fmt::Debug for HookHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookHandler")
            .field("owner", &self.owner)
            .field("priority", &self.priority)
            .field("kind", &self.kind)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

impl HookHandler {
    /// A call handler receiving `&A`.
    pub fn call<A, F>(owner: &str, f: F) -> Self
    where
        A: 'static,
        F: Fn(&A) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        let callable: CallFn<A> = Box::new(f);
        Self {
            owner: Arc::from(owner),
            priority: DEFAULT_PRIORITY,
            kind: HandlerKind::Call,
            signature: std::any::type_name::<A>(),
            callable: Arc::new(callable),
        }
    }

    /// A filter handler threading a `V` with extra arguments `&A`.
    pub fn filter<V, A, F>(owner: &str, f: F) -> Self
    where
        V: 'static,
        A: 'static,
        F: Fn(V, &A) -> Result<V, BoxError> + Send + Sync + 'static,
    {
        let callable: FilterFn<V, A> = Box::new(f);
        Self {
            owner: Arc::from(owner),
            priority: DEFAULT_PRIORITY,
            kind: HandlerKind::Filter,
            signature: std::any::type_name::<(V, A)>(),
            callable: Arc::new(callable),
        }
    }

    /// Set the priority. Lower runs first.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// The extension that registered this handler.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// The handler's priority.
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// The handler's kind.
    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    /// The argument types the handler was registered for.
    pub fn signature(&self) -> &'static str {
        self.signature
    }

    pub(crate) fn as_call<A: 'static>(&self) -> Option<&CallFn<A>> {
        self.callable.downcast_ref::<CallFn<A>>()
    }

    pub(crate) fn as_filter<V: 'static, A: 'static>(&self) -> Option<&FilterFn<V, A>> {
        self.callable.downcast_ref::<FilterFn<V, A>>()
    }
}

/// A single-hop redirect from one hook name to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookAlias {
    /// The name being fired.
    pub from: String,
    /// The name whose handlers run instead.
    pub to: String,
    /// The extension that declared the alias, if any.
    pub owner: Option<String>,
}

/// Hook name to handler list, plus aliases.
///
/// # Example
///
/// ```rust
/// use lectern_std::hooks::{HookHandler, HookRegistry};
///
/// let mut hooks = HookRegistry::new();
/// hooks.register("publish", HookHandler::call("seo", |_: &u64| Ok(())).with_priority(5));
/// hooks.on_call("publish", "cache", |_: &u64| {});
/// hooks.alias("publish_post", "publish");
///
/// let owners: Vec<_> = hooks.handlers("publish_post").iter().map(|h| h.owner()).collect();
/// assert_eq!(owners, ["seo", "cache"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    handlers: HashMap<String, Vec<HookHandler>>,
    aliases: HashMap<String, HookAlias>,
}

impl HookRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `hook`.
    ///
    /// The list stays sorted by ascending priority; handlers with equal
    /// priority keep their registration order.
    pub fn register(&mut self, hook: impl Into<String>, handler: HookHandler) {
        let hook = hook.into();
        tracing::trace!(
            hook = %hook,
            owner = handler.owner(),
            priority = handler.priority,
            "hook handler registered"
        );

        let list = self.handlers.entry(hook).or_default();
        let at = list.partition_point(|h| h.priority <= handler.priority);
        list.insert(at, handler);
    }

    /// Register an infallible call handler at the default priority.
    pub fn on_call<A, F>(&mut self, hook: impl Into<String>, owner: &str, f: F)
    where
        A: 'static,
        F: Fn(&A) + Send + Sync + 'static,
    {
        self.register(
            hook,
            HookHandler::call(owner, move |args: &A| {
                f(args);
                Ok(())
            }),
        );
    }

    /// Register an infallible filter handler that takes no extra arguments.
    pub fn on_filter<V, F>(&mut self, hook: impl Into<String>, owner: &str, f: F)
    where
        V: 'static,
        F: Fn(V) -> V + Send + Sync + 'static,
    {
        self.register(
            hook,
            HookHandler::filter(owner, move |value: V, _: &()| Ok(f(value))),
        );
    }

    /// Register an infallible filter handler with extra arguments `&A`.
    pub fn on_filter_with<V, A, F>(&mut self, hook: impl Into<String>, owner: &str, f: F)
    where
        V: 'static,
        A: 'static,
        F: Fn(V, &A) -> V + Send + Sync + 'static,
    {
        self.register(
            hook,
            HookHandler::filter(owner, move |value: V, args: &A| Ok(f(value, args))),
        );
    }

    /// Redirect `from` to `to`. Replaces any existing alias for `from`.
    pub fn alias(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.insert_alias(from.into(), to.into(), None);
    }

    /// Like [`alias`](Self::alias), recording `owner` so the alias goes away
    /// with the owner's handlers.
    pub fn alias_for(&mut self, owner: &str, from: impl Into<String>, to: impl Into<String>) {
        self.insert_alias(from.into(), to.into(), Some(owner.to_string()));
    }

    fn insert_alias(&mut self, from: String, to: String, owner: Option<String>) {
        tracing::trace!(from = %from, to = %to, "hook alias added");
        self.aliases
            .insert(from.clone(), HookAlias { from, to, owner });
    }

    /// Remove the alias for `from`, returning it.
    pub fn unalias(&mut self, from: &str) -> Option<HookAlias> {
        self.aliases.remove(from)
    }

    /// The alias declared for `from`, if any.
    pub fn alias_of(&self, from: &str) -> Option<&HookAlias> {
        self.aliases.get(from)
    }

    /// The name whose handlers run when `hook` is fired. Single hop.
    pub fn resolve_name<'a>(&'a self, hook: &'a str) -> &'a str {
        self.aliases.get(hook).map_or(hook, |alias| alias.to.as_str())
    }

    /// The handlers that run when `hook` is fired, in execution order.
    pub fn handlers(&self, hook: &str) -> &[HookHandler] {
        self.registered(self.resolve_name(hook))
    }

    /// The handlers registered directly on `hook`, ignoring aliases.
    pub fn registered(&self, hook: &str) -> &[HookHandler] {
        self.handlers.get(hook).map_or(&[], Vec::as_slice)
    }

    /// Whether firing `hook` would run at least one handler.
    pub fn exists(&self, hook: &str) -> bool {
        !self.handlers(hook).is_empty()
    }

    /// Whether firing `hook` would run at least one handler of `kind`.
    pub fn exists_kind(&self, hook: &str, kind: HandlerKind) -> bool {
        self.handlers(hook).iter().any(|h| h.kind() == kind)
    }

    /// Remove every handler and alias contributed by `owner`.
    ///
    /// Other owners' handlers keep their relative order. Returns the number
    /// of handlers removed.
    pub fn unregister_owner(&mut self, owner: &str) -> usize {
        let mut removed = 0;
        self.handlers.retain(|_, list| {
            let before = list.len();
            list.retain(|h| h.owner() != owner);
            removed += before - list.len();
            !list.is_empty()
        });
        self.aliases
            .retain(|_, alias| alias.owner.as_deref() != Some(owner));

        tracing::debug!(owner, removed, "hook handlers unregistered");
        removed
    }

    /// Names that have at least one directly registered handler.
    pub fn hook_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Total number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    /// Check if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
