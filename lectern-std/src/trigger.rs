//! # Trigger
//!
//! The runtime hook API: [`call`](Trigger::call) notifies every handler,
//! [`filter`](Trigger::filter) threads a value through them, and
//! [`exists`](Trigger::exists) asks whether anyone is listening.
//!
//! Handlers run synchronously, one after another, in priority order. Each
//! handler is isolated: an error or a panic is logged, recorded and treated
//! as a no-op (for `call`) or as the identity transform (for `filter`).
//!
//! The handler list is snapshotted under a read lock and the lock is released
//! before any handler runs, so handlers may fire other hooks or register new
//! handlers.

use crate::hooks::{HandlerKind, HookHandler, HookRegistry};
use lectern_core::{BoxError, HookError};
use parking_lot::RwLock;
use std::any::type_name;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// What happened when a hook was called.
#[derive(Debug)]
#[must_use = "inspect `failures` or call `is_clean` to notice failing handlers"]
pub struct CallReport {
    /// The hook whose handlers ran, after alias resolution.
    pub hook: String,
    /// Handlers that ran to completion.
    pub invoked: usize,
    /// Handlers that failed, panicked or did not accept the arguments.
    pub failures: Vec<HookError>,
}

impl CallReport {
    /// True when no handler failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// True when at least one handler ran to completion.
    pub fn handled(&self) -> bool {
        self.invoked > 0
    }
}

/// A cloneable handle to a shared [`HookRegistry`].
///
/// # Example
///
/// ```rust
/// use lectern_std::trigger::Trigger;
///
/// let trigger = Trigger::new();
/// trigger.update(|hooks| {
///     hooks.on_filter("x", "plus", |v: i32| v + 1);
///     hooks.on_filter("x", "double", |v: i32| v * 2);
/// });
///
/// assert_eq!(trigger.filter("x", 10), 22);
/// assert_eq!(trigger.filter("unknown", 10), 10);
/// ```
#[derive(Clone, Default)]
pub struct Trigger {
    registry: Arc<RwLock<HookRegistry>>,
}

impl std::fmt::Debug for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("handlers", &self.registry.read().len())
            .finish()
    }
}

impl From<HookRegistry> for Trigger {
    fn from(registry: HookRegistry) -> Self {
        Self {
            registry: Arc::new(RwLock::new(registry)),
        }
    }
}

impl Trigger {
    /// Create a trigger over an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutate the registry under the write lock.
    pub fn update<R>(&self, f: impl FnOnce(&mut HookRegistry) -> R) -> R {
        f(&mut self.registry.write())
    }

    /// Inspect the registry under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&HookRegistry) -> R) -> R {
        f(&self.registry.read())
    }

    /// Whether firing `hook` would run at least one handler.
    pub fn exists(&self, hook: &str) -> bool {
        self.registry.read().exists(hook)
    }

    /// Whether [`call`](Self::call) on `hook` would run at least one handler.
    pub fn has_callers(&self, hook: &str) -> bool {
        self.registry.read().exists_kind(hook, HandlerKind::Call)
    }

    fn snapshot(&self, hook: &str, kind: HandlerKind) -> (String, Vec<HookHandler>) {
        let registry = self.registry.read();
        let resolved = registry.resolve_name(hook).to_string();
        let handlers = registry
            .handlers(hook)
            .iter()
            .filter(|h| h.kind() == kind)
            .cloned()
            .collect();
        (resolved, handlers)
    }

    /// Notify every call handler of `hook` with `args`.
    pub fn call<A: 'static>(&self, hook: &str, args: &A) -> CallReport {
        let (resolved, handlers) = self.snapshot(hook, HandlerKind::Call);
        let mut report = CallReport {
            hook: resolved,
            invoked: 0,
            failures: Vec::new(),
        };

        for handler in &handlers {
            tracing::trace!(hook = %report.hook, owner = handler.owner(), "calling handler");

            let Some(f) = handler.as_call::<A>() else {
                report
                    .failures
                    .push(mismatch(&report.hook, handler, type_name::<A>()));
                continue;
            };
            match isolate(&report.hook, handler, || f(args)) {
                Ok(()) => report.invoked += 1,
                Err(err) => report.failures.push(err),
            }
        }

        for failure in &report.failures {
            tracing::warn!(hook = %report.hook, owner = failure.owner(), error = %failure, "hook handler failed");
        }
        report
    }

    /// Thread `value` through every filter handler of `hook`.
    pub fn filter<V: Clone + 'static>(&self, hook: &str, value: V) -> V {
        self.filter_with(hook, value, &())
    }

    /// Thread `value` through every filter handler of `hook`, passing `args`
    /// alongside.
    ///
    /// A failing handler is skipped: the next handler receives the value the
    /// failing one was given.
    pub fn filter_with<V, A>(&self, hook: &str, value: V, args: &A) -> V
    where
        V: Clone + 'static,
        A: 'static,
    {
        let (resolved, handlers) = self.snapshot(hook, HandlerKind::Filter);
        let mut value = value;

        for handler in &handlers {
            tracing::trace!(hook = %resolved, owner = handler.owner(), "filtering");

            let outcome = match handler.as_filter::<V, A>() {
                Some(f) => {
                    let input = value.clone();
                    isolate(&resolved, handler, || f(input, args))
                }
                None => Err(mismatch(&resolved, handler, type_name::<(V, A)>())),
            };
            match outcome {
                Ok(next) => value = next,
                Err(err) => {
                    tracing::warn!(hook = %resolved, owner = handler.owner(), error = %err, "filter handler failed");
                }
            }
        }
        value
    }

    /// Thread `value` through several hooks in turn.
    pub fn filter_each<V, A>(&self, hooks: &[&str], value: V, args: &A) -> V
    where
        V: Clone + 'static,
        A: 'static,
    {
        hooks
            .iter()
            .fold(value, |value, hook| self.filter_with(hook, value, args))
    }
}

fn mismatch(hook: &str, handler: &HookHandler, expected: &'static str) -> HookError {
    HookError::TypeMismatch {
        hook: hook.to_string(),
        owner: handler.owner().to_string(),
        expected,
    }
}

/// Run one handler, turning its error or panic into a [`HookError`].
fn isolate<T>(
    hook: &str,
    handler: &HookHandler,
    f: impl FnOnce() -> Result<T, BoxError>,
) -> Result<T, HookError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(HookError::Failed {
            hook: hook.to_string(),
            owner: handler.owner().to_string(),
            source,
        }),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(HookError::Panicked {
                hook: hook.to_string(),
                owner: handler.owner().to_string(),
                message,
            })
        }
    }
}
