//! The service wrapper and per-path call handles.
//!
//! [`WrappedService`] marks a raw service as routed through hooks and caches
//! the method list it exposes. [`ServiceHandle`] binds a wrapped service to
//! its path and application and is the entry point for calls: it validates
//! the method, builds the [`HookContext`], runs the [`Pipeline`] and
//! publishes the resulting event.

use core::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use plume_service::{Id, Method, Params, Service, ServiceError, ServiceResult};
use serde_json::Value;
use tracing::Instrument;

use crate::application::Application;
use crate::context::HookContext;
use crate::error::{AppError, DispatchError};
use crate::events::ServiceEvent;
use crate::hooks::{HookMap, Pipeline, Scope};

// ─────────────────────────────────────────────────────────────────────────────
// WrappedService
// ─────────────────────────────────────────────────────────────────────────────

/// A raw service prepared for hook dispatch.
///
/// Wrapping is idempotent: [`WrappedService::wrap`] returns an already
/// wrapped service unchanged, so hooks never run twice for one call.
pub struct WrappedService {
    inner: Arc<dyn Service>,
    methods: Vec<Method>,
}

impl WrappedService {
    /// Wraps `service`, or returns it as is if it is already wrapped.
    #[must_use]
    pub fn wrap(service: Arc<dyn Service>) -> Arc<WrappedService> {
        match service.downcast_arc::<WrappedService>() {
            Ok(wrapped) => wrapped,
            Err(raw) => {
                let methods = raw.methods();
                Arc::new(WrappedService {
                    inner: raw,
                    methods,
                })
            }
        }
    }

    /// The raw service.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn Service> {
        &self.inner
    }

    /// Returns true if the service exposes `method`.
    #[must_use]
    pub fn has_method(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }
}

impl fmt::Debug for WrappedService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrappedService")
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Service for WrappedService {
    fn methods(&self) -> Vec<Method> {
        self.methods.clone()
    }

    async fn find(&self, params: &Params) -> ServiceResult {
        self.inner.find(params).await
    }

    async fn get(&self, id: &Id, params: &Params) -> ServiceResult {
        self.inner.get(id, params).await
    }

    async fn create(&self, data: Value, params: &Params) -> ServiceResult {
        self.inner.create(data, params).await
    }

    async fn update(&self, id: Option<&Id>, data: Value, params: &Params) -> ServiceResult {
        self.inner.update(id, data, params).await
    }

    async fn patch(&self, id: Option<&Id>, data: Value, params: &Params) -> ServiceResult {
        self.inner.patch(id, data, params).await
    }

    async fn remove(&self, id: Option<&Id>, params: &Params) -> ServiceResult {
        self.inner.remove(id, params).await
    }

    async fn call_custom(&self, name: &str, data: Value, params: &Params) -> ServiceResult {
        self.inner.call_custom(name, data, params).await
    }

    async fn setup(&self, path: &str) -> Result<(), ServiceError> {
        self.inner.setup(path).await
    }

    async fn teardown(&self, path: &str) -> Result<(), ServiceError> {
        self.inner.teardown(path).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ServiceHandle
// ─────────────────────────────────────────────────────────────────────────────

/// A registered service bound to its application.
///
/// Every call made through a handle runs the full hook pipeline. Handles are
/// cheap to clone and may be used from many tasks at once; each call gets its
/// own context.
#[derive(Clone)]
pub struct ServiceHandle {
    app: Application,
    path: Arc<str>,
    service: Arc<WrappedService>,
}

impl ServiceHandle {
    pub(crate) fn new(app: Application, path: Arc<str>, service: Arc<WrappedService>) -> Self {
        Self { app, path, service }
    }

    /// The normalized path of the service.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The methods the service exposes.
    #[must_use]
    pub fn methods(&self) -> Vec<Method> {
        self.service.methods()
    }

    /// The wrapped service.
    #[must_use]
    pub fn service(&self) -> &Arc<WrappedService> {
        &self.service
    }

    /// Registers service-scope hooks.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ServiceNotFound`] if the service is no longer
    /// registered under this handle's path, and [`AppError::InvalidHook`] if
    /// a hook names a method the service does not expose, or selects no
    /// method at all. Hooks of the map that precede the invalid one stay
    /// registered.
    pub fn hooks(&self, map: HookMap) -> Result<&Self, AppError> {
        let scope = Scope::service(self.path());
        let registered = self.app.while_registered(&self.path, &self.service, || {
            if let Some(unknown) = map.named_methods().find(|m| !self.service.has_method(m)) {
                return Err(AppError::invalid_hook(
                    &scope,
                    format!("method '{unknown}' is not exposed by the service"),
                ));
            }

            for entry in map.into_entries() {
                self.app
                    .hook_registry()
                    .register_arc(scope.clone(), entry.phase, entry.methods, entry.hook)?;
            }
            Ok(())
        })?;
        registered?;
        Ok(self)
    }

    /// Calls `method` through the hook pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ServiceNotFound`] or [`AppError::MethodNotFound`]
    /// before any hook runs (see [`run`](Self::run)), otherwise the error the
    /// pipeline ended with.
    pub async fn call(
        &self,
        method: Method,
        id: Option<Id>,
        data: Option<Value>,
        params: Params,
    ) -> Result<Value, DispatchError> {
        let ctx = self.run(method, id, data, params).await?;

        let event = ctx.event.clone().filter(|_| ctx.error.is_none());
        let id = ctx.id.clone();
        let method = ctx.method().clone();
        let outcome = ctx.into_outcome()?;

        if let Some(event) = event {
            self.publish(&event, &method, id, &outcome);
        }
        Ok(outcome)
    }

    /// Runs the pipeline and returns the final context instead of its outcome.
    ///
    /// No event is published. Transports use this to read `status_code` or
    /// extensions set by hooks.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ServiceNotFound`] if the service was removed or
    /// replaced since this handle was obtained, and
    /// [`AppError::MethodNotFound`] if the service does not expose `method`.
    /// Failures inside the pipeline are recorded on the returned context.
    pub async fn run(
        &self,
        method: Method,
        id: Option<Id>,
        data: Option<Value>,
        params: Params,
    ) -> Result<HookContext, AppError> {
        self.app.while_registered(&self.path, &self.service, || ())?;
        if !self.service.has_method(&method) {
            return Err(AppError::MethodNotFound {
                path: self.path.to_string(),
                method,
            });
        }

        let span = tracing::debug_span!("service.call", path = %self.path, method = %method);
        let mut ctx = HookContext::new(
            self.app.clone(),
            Arc::clone(self.service.inner()),
            Arc::clone(&self.path),
            method,
            params,
        );
        ctx.id = id;
        ctx.data = data;

        let config = self.app.config();
        let pipeline = Pipeline::new(self.app.hook_registry(), &config.disabled_phases);
        let ctx = pipeline
            .execute(ctx, self.service.inner().as_ref())
            .instrument(span)
            .await;
        Ok(ctx)
    }

    fn publish(&self, event: &str, method: &Method, id: Option<Id>, outcome: &Value) {
        if !self.app.config().emit_events {
            return;
        }

        let bus = self.app.events();
        let emit = |data: Value| {
            bus.emit(ServiceEvent {
                path: self.path.to_string(),
                event: event.to_owned(),
                method: method.clone(),
                id: id.clone(),
                data,
            });
        };

        match outcome {
            Value::Array(items) => items.iter().cloned().for_each(&emit),
            single => emit(single.clone()),
        }
    }

    /// Lists records.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's terminal error.
    pub async fn find(&self, params: Params) -> Result<Value, DispatchError> {
        self.call(Method::Find, None, None, params).await
    }

    /// Fetches one record.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's terminal error.
    pub async fn get(
        &self,
        id: impl Into<Id>,
        params: Params,
    ) -> Result<Value, DispatchError> {
        self.call(Method::Get, Some(id.into()), None, params).await
    }

    /// Creates records.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's terminal error.
    pub async fn create(&self, data: Value, params: Params) -> Result<Value, DispatchError> {
        self.call(Method::Create, None, Some(data), params).await
    }

    /// Replaces a record.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's terminal error.
    pub async fn update(
        &self,
        id: Option<Id>,
        data: Value,
        params: Params,
    ) -> Result<Value, DispatchError> {
        self.call(Method::Update, id, Some(data), params).await
    }

    /// Merges data into records.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's terminal error.
    pub async fn patch(
        &self,
        id: Option<Id>,
        data: Value,
        params: Params,
    ) -> Result<Value, DispatchError> {
        self.call(Method::Patch, id, Some(data), params).await
    }

    /// Removes records.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's terminal error.
    pub async fn remove(
        &self,
        id: Option<Id>,
        params: Params,
    ) -> Result<Value, DispatchError> {
        self.call(Method::Remove, id, None, params).await
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("path", &self.path)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}
