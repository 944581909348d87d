//! The hook pipeline executor.
//!
//! [`Pipeline::execute`] runs one service call through its hook chains:
//!
//! 1. `before` hooks, app scope then service scope. A hook that sets
//!    `result` skips the remaining `before` hooks and the service method.
//! 2. The service method, unless short-circuited.
//! 3. `after` hooks, service scope then app scope.
//! 4. `error` hooks, service scope then app scope, whenever a hook or the
//!    service method failed. A hook that clears `error` recovers the call and
//!    ends the chain.
//!
//! Hooks of one call run strictly in sequence. A failure never escapes the
//! executor: it is recorded on the context and routed to the `error` chain,
//! and the caller reads the terminal outcome with
//! [`HookContext::into_outcome`].

use std::sync::Arc;

use plume_service::{Service, ServiceError, call_method};
use tracing::Instrument;

use super::hook::Hook;
use super::phase::{Phase, Scope};
use super::registry::HookRegistry;
use crate::context::HookContext;

/// How a chain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Every hook ran.
    Continue,
    /// A `before` hook produced a result.
    ShortCircuit,
    /// A hook failed or set an error.
    Fail,
}

/// Executes service calls through the hooks of a registry.
#[derive(Clone, Copy)]
pub struct Pipeline<'a> {
    registry: &'a HookRegistry,
    disabled: &'a [Phase],
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline over `registry`. Hooks of `disabled` phases never run.
    #[must_use]
    pub fn new(registry: &'a HookRegistry, disabled: &'a [Phase]) -> Self {
        Self { registry, disabled }
    }

    /// Runs the call described by `ctx` against `service`.
    ///
    /// `ctx` is expected in the `before` phase. The returned context is in the
    /// `after` phase on success and the `error` phase on failure.
    pub async fn execute(&self, mut ctx: HookContext, service: &dyn Service) -> HookContext {
        ctx.set_phase(Phase::Before);

        match self.run_before(&mut ctx).await {
            Flow::Continue => self.call_service(&mut ctx, service).await,
            Flow::ShortCircuit => {
                tracing::debug!(path = ctx.path(), method = %ctx.method(), "call short-circuited");
                ctx.set_phase(Phase::After);
            }
            Flow::Fail => ctx.set_phase(Phase::Error),
        }

        if ctx.phase() == Phase::After {
            self.run_after(&mut ctx).await;
        }
        if ctx.phase() == Phase::Error {
            self.run_error(&mut ctx).await;
        }

        ctx
    }

    /// Resolves the hooks of `phase` for the call, in execution order.
    fn chain(&self, phase: Phase, ctx: &HookContext) -> Vec<Arc<dyn Hook>> {
        if self.disabled.contains(&phase) {
            return Vec::new();
        }

        let service = Scope::service(ctx.path());
        let scopes = match phase {
            Phase::Before => [Scope::App, service],
            Phase::After | Phase::Error => [service, Scope::App],
        };

        scopes
            .iter()
            .flat_map(|scope| self.registry.resolve(scope, phase, ctx.method()))
            .collect()
    }

    async fn run_before(&self, ctx: &mut HookContext) -> Flow {
        for hook in self.chain(Phase::Before, ctx) {
            if let Err(error) = run_hook(hook.as_ref(), ctx).await {
                ctx.error = Some(error);
                return Flow::Fail;
            }
            if ctx.error.is_some() {
                return Flow::Fail;
            }
            if ctx.result.is_some() {
                return Flow::ShortCircuit;
            }
        }
        Flow::Continue
    }

    async fn call_service(&self, ctx: &mut HookContext, service: &dyn Service) {
        let data = ctx.data.clone();
        let outcome = call_method(service, ctx.method(), ctx.id.as_ref(), data, &ctx.params).await;

        match outcome {
            Ok(result) => {
                ctx.result = Some(result);
                ctx.set_phase(Phase::After);
            }
            Err(error) => {
                tracing::debug!(path = ctx.path(), method = %ctx.method(), %error, "service method failed");
                ctx.error = Some(error);
                ctx.set_phase(Phase::Error);
            }
        }
    }

    async fn run_after(&self, ctx: &mut HookContext) {
        for hook in self.chain(Phase::After, ctx) {
            if let Err(error) = run_hook(hook.as_ref(), ctx).await {
                ctx.error = Some(error);
            }
            if ctx.error.is_some() {
                ctx.set_phase(Phase::Error);
                return;
            }
        }
    }

    async fn run_error(&self, ctx: &mut HookContext) {
        for hook in self.chain(Phase::Error, ctx) {
            if let Err(error) = run_hook(hook.as_ref(), ctx).await {
                // The newer failure wins; remaining error hooks still run.
                ctx.error = Some(error);
                continue;
            }
            if ctx.error.is_none() {
                tracing::debug!(path = ctx.path(), method = %ctx.method(), "call recovered");
                ctx.set_phase(Phase::After);
                return;
            }
        }
    }
}

/// Runs one hook and applies a replacement context if it returned one.
async fn run_hook(hook: &dyn Hook, ctx: &mut HookContext) -> Result<(), ServiceError> {
    let span = tracing::debug_span!("hook", phase = %ctx.phase(), hook = hook.name());

    if let Some(replacement) = hook.run(ctx).instrument(span).await? {
        if !ctx.adopt(replacement) {
            tracing::warn!(
                hook = hook.name(),
                path = ctx.path(),
                "hook returned a context of another call, ignoring it"
            );
        }
    }
    Ok(())
}
