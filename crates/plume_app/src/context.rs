//! The per-call record threaded through a hook chain.

use core::fmt;
use std::sync::Arc;

use plume_service::{Id, Method, Params, Service, ServiceError};
use serde_json::Value;

use crate::application::Application;
use crate::extensions::Extensions;
use crate::hooks::Phase;

/// The mutable record of one in-flight service call.
///
/// A context is created by the service wrapper for every call and handed by
/// mutable reference to each hook in turn, so every mutation is visible to
/// the hooks that follow and to the service method itself.
///
/// The identity of the call (`app`, `service`, `path`, `method`) and its
/// `phase` are read-only for hooks. Everything else is public and freely
/// mutable:
///
/// - Mutating `params`, `id` or `data` in a `before` hook changes what the
///   service method receives.
/// - Setting `result` in a `before` hook skips the service method.
/// - Mutating `result` in an `after` hook changes what the caller receives.
/// - Setting `error` in any phase fails the call; clearing it in an `error`
///   hook recovers the call.
#[derive(Clone)]
pub struct HookContext {
    app: Application,
    service: Arc<dyn Service>,
    path: Arc<str>,
    method: Method,
    phase: Phase,

    /// Caller-supplied call options.
    pub params: Params,
    /// Record identifier for single-record methods.
    pub id: Option<Id>,
    /// Request payload for mutating and custom methods.
    pub data: Option<Value>,
    /// Response payload.
    pub result: Option<Value>,
    /// Failure of the call.
    pub error: Option<ServiceError>,
    /// Status code a transport should answer with on success.
    pub status_code: Option<u16>,
    /// Name of the event published on success; `None` suppresses it.
    pub event: Option<String>,
    /// Typed state shared between hooks of this call.
    pub extensions: Extensions,
}

impl HookContext {
    pub(crate) fn new(
        app: Application,
        service: Arc<dyn Service>,
        path: Arc<str>,
        method: Method,
        params: Params,
    ) -> Self {
        let event = method.event_name().map(str::to_owned);
        Self {
            app,
            service,
            path,
            method,
            phase: Phase::Before,
            params,
            id: None,
            data: None,
            result: None,
            error: None,
            status_code: None,
            event,
            extensions: Extensions::new(),
        }
    }

    /// The application the call runs in.
    #[must_use]
    pub fn app(&self) -> &Application {
        &self.app
    }

    /// The raw service being called.
    #[must_use]
    pub fn service(&self) -> &Arc<dyn Service> {
        &self.service
    }

    /// The normalized path the service is registered under.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The called method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The phase the call is currently in.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Sets the result and returns `self` for chaining inside hooks.
    pub fn set_result(&mut self, result: impl Into<Value>) -> &mut Self {
        self.result = Some(result.into());
        self
    }

    /// Returns true if `other` describes the same call as `self`.
    #[must_use]
    pub fn is_same_call(&self, other: &HookContext) -> bool {
        self.path == other.path
            && self.method == other.method
            && self.app.ptr_eq(&other.app)
            && core::ptr::addr_eq(Arc::as_ptr(&self.service), Arc::as_ptr(&other.service))
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Replaces this context with a hook-supplied one, keeping the phase.
    ///
    /// Returns false and leaves `self` untouched when the replacement belongs
    /// to a different call.
    pub(crate) fn adopt(&mut self, mut replacement: HookContext) -> bool {
        if !self.is_same_call(&replacement) {
            return false;
        }
        replacement.phase = self.phase;
        *self = replacement;
        true
    }

    /// Terminal outcome of the call.
    ///
    /// # Errors
    ///
    /// Returns the context's error if one is set.
    pub fn into_outcome(self) -> Result<Value, ServiceError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

impl fmt::Debug for HookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("phase", &self.phase)
            .field("params", &self.params)
            .field("id", &self.id)
            .field("data", &self.data)
            .field("result", &self.result)
            .field("error", &self.error)
            .field("status_code", &self.status_code)
            .field("event", &self.event)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}
