//! The hook trait and closure adapters.

use core::future::Future;
use core::pin::Pin;

use plume_service::ServiceError;

use crate::context::HookContext;

/// Type alias for a pinned, boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Return value of a hook.
///
/// - `Ok(None)`: continue with the (possibly mutated) context.
/// - `Ok(Some(ctx))`: continue with a replacement context. The replacement
///   must belong to the same call; otherwise it is ignored.
/// - `Err(error)`: the call fails and moves to the error phase.
pub type HookResult = Result<Option<HookContext>, ServiceError>;

/// An interceptor that runs around service method calls.
///
/// Hooks receive the call's context by mutable reference. Hooks of one call
/// run strictly one after another, so a hook always observes every mutation
/// made by the hooks before it.
///
/// Most hooks are written as closures via [`hook_fn`] or [`async_hook`].
/// Implement the trait directly for hooks that carry configuration:
///
/// ```
/// use plume_app::hooks::{BoxFuture, Hook, HookResult};
/// use plume_app::HookContext;
///
/// struct Stamp(&'static str);
///
/// impl Hook for Stamp {
///     fn run<'a>(&'a self, ctx: &'a mut HookContext) -> BoxFuture<'a, HookResult> {
///         Box::pin(async move {
///             ctx.params.set("stamp", self.0.into());
///             Ok(None)
///         })
///     }
/// }
/// ```
pub trait Hook: Send + Sync + 'static {
    /// Runs the hook against the call's context.
    fn run<'a>(&'a self, ctx: &'a mut HookContext) -> BoxFuture<'a, HookResult>;

    /// Name used in log output.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Synchronous closures
// ─────────────────────────────────────────────────────────────────────────────

/// A hook backed by a synchronous closure. Created by [`hook_fn`].
pub struct FnHook<F> {
    name: &'static str,
    f: F,
}

/// Wraps a synchronous closure as a hook.
///
/// The closure mutates the context in place; returning an error moves the
/// call to the error phase.
///
/// ```
/// use plume_app::hooks::hook_fn;
///
/// let hook = hook_fn(|ctx| {
///     ctx.params.set("seen", true.into());
///     Ok(())
/// });
/// ```
pub fn hook_fn<F>(f: F) -> FnHook<F>
where
    F: Fn(&mut HookContext) -> Result<(), ServiceError> + Send + Sync + 'static,
{
    FnHook {
        name: core::any::type_name::<F>(),
        f,
    }
}

impl<F> FnHook<F> {
    /// Sets the name used in log output.
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl<F> Hook for FnHook<F>
where
    F: Fn(&mut HookContext) -> Result<(), ServiceError> + Send + Sync + 'static,
{
    fn run<'a>(&'a self, ctx: &'a mut HookContext) -> BoxFuture<'a, HookResult> {
        let outcome = (self.f)(ctx).map(|()| None);
        Box::pin(core::future::ready(outcome))
    }

    fn name(&self) -> &str {
        self.name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Asynchronous closures
// ─────────────────────────────────────────────────────────────────────────────

/// A hook backed by a closure returning a boxed future. Created by [`async_hook`].
pub struct AsyncFnHook<F> {
    name: &'static str,
    f: F,
}

/// Wraps an asynchronous closure as a hook.
///
/// The closure borrows the context for the lifetime of the returned future,
/// so it must box it explicitly:
///
/// ```
/// use plume_app::hooks::async_hook;
///
/// let hook = async_hook(|ctx| {
///     Box::pin(async move {
///         let user = ctx.params.user.clone();
///         ctx.params.set("checked", user.is_some().into());
///         Ok(None)
///     })
/// });
/// ```
pub fn async_hook<F>(f: F) -> AsyncFnHook<F>
where
    F: for<'a> Fn(&'a mut HookContext) -> BoxFuture<'a, HookResult> + Send + Sync + 'static,
{
    AsyncFnHook {
        name: core::any::type_name::<F>(),
        f,
    }
}

impl<F> AsyncFnHook<F> {
    /// Sets the name used in log output.
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl<F> Hook for AsyncFnHook<F>
where
    F: for<'a> Fn(&'a mut HookContext) -> BoxFuture<'a, HookResult> + Send + Sync + 'static,
{
    fn run<'a>(&'a self, ctx: &'a mut HookContext) -> BoxFuture<'a, HookResult> {
        (self.f)(ctx)
    }

    fn name(&self) -> &str {
        self.name
    }
}
