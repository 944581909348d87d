//! The application: registry of services, hooks, settings and plugins.
//!
//! # Lifecycle
//!
//! 1. **Configure**: create with [`Application::with_config`], register
//!    services with [`use_service`](Application::use_service), hooks with
//!    [`hooks`](Application::hooks), and plugins with
//!    [`configure`](Application::configure).
//! 2. **Setup**: [`setup`](Application::setup) readies plugins and runs each
//!    service's `setup`.
//! 3. **Serve**: transports call [`dispatch`](Application::dispatch) or a
//!    [`ServiceHandle`] concurrently.
//! 4. **Teardown**: [`teardown`](Application::teardown) releases services and
//!    plugins in reverse order.
//!
//! Registration is expected to finish before concurrent traffic starts.
//! During dispatch, registries are only read.

use core::any::{Any, TypeId};
use core::fmt;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use plume_service::{Id, Method, Params, Service};
use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::config::{AppConfig, DuplicatePathPolicy};
use crate::error::{AppError, DispatchError};
use crate::events::{EventBus, ServiceEvent};
use crate::hooks::{Hook, HookMap, HookRegistry, MethodFilter, Phase, Scope};
use crate::plugin::{BoxedPlugin, Plugin, PluginId, Plugins};
use crate::wrapper::{ServiceHandle, WrappedService};

/// Strips leading and trailing slashes from a service path.
///
/// ```
/// use plume_app::normalize_path;
///
/// assert_eq!(normalize_path("/api/users/"), "api/users");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal state
// ─────────────────────────────────────────────────────────────────────────────

struct ServiceEntry {
    path: Arc<str>,
    service: Arc<WrappedService>,
    set_up: bool,
}

#[derive(Default)]
struct PluginState {
    entries: Vec<BoxedPlugin>,
    ids: HashSet<PluginId>,
    /// Number of leading entries whose `ready` has run.
    readied: usize,
}

struct AppInner {
    config: AppConfig,
    services: RwLock<IndexMap<String, ServiceEntry>>,
    hooks: HookRegistry,
    events: EventBus,
    settings: RwLock<Map<String, Value>>,
    resources: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    plugins: Mutex<PluginState>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Application
// ─────────────────────────────────────────────────────────────────────────────

/// A Plume application.
///
/// `Application` is a cheap handle: clones share the same services, hooks and
/// settings. There is no global instance; pass the application to whatever
/// needs to dispatch calls.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use plume_app::Application;
/// use plume_app::hooks::{HookMap, hook_fn};
/// use plume_service::{Method, Params, Service, ServiceResult};
/// use serde_json::{Value, json};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Service for Echo {
///     fn methods(&self) -> Vec<Method> {
///         vec![Method::Create]
///     }
///
///     async fn create(&self, data: Value, _params: &Params) -> ServiceResult {
///         Ok(data)
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let app = Application::new();
/// app.use_service("echo", Echo)?.hooks(HookMap::new().before_all(hook_fn(|ctx| {
///     ctx.data = Some(json!({ "stamped": true }));
///     Ok(())
/// })))?;
///
/// let result = app.service("echo")?.create(json!({}), Params::new()).await?;
/// assert_eq!(result, json!({ "stamped": true }));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Application {
    inner: Arc<AppInner>,
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// Creates an application with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Creates an application with `config`.
    #[must_use]
    pub fn with_config(config: AppConfig) -> Self {
        let settings = config.settings.clone();
        let events = EventBus::with_capacity(config.event_capacity);
        Self {
            inner: Arc::new(AppInner {
                config,
                services: RwLock::new(IndexMap::new()),
                hooks: HookRegistry::new(),
                events,
                settings: RwLock::new(settings),
                resources: RwLock::new(HashMap::new()),
                plugins: Mutex::new(PluginState::default()),
            }),
        }
    }

    /// The configuration the application was created with.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Returns true if both handles refer to the same application.
    #[must_use]
    pub fn ptr_eq(&self, other: &Application) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Services
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers `service` under `path`.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidPath`] if `path` is empty after stripping slashes.
    /// - [`AppError::DuplicatePath`] if the path is taken and the policy is
    ///   [`DuplicatePathPolicy::Reject`].
    pub fn use_service<S: Service>(
        &self,
        path: &str,
        service: S,
    ) -> Result<ServiceHandle, AppError> {
        self.use_arc(path, Arc::new(service))
    }

    /// Registers an already shared service under `path`.
    ///
    /// Passing a service that is already wrapped does not wrap it again.
    ///
    /// # Errors
    ///
    /// See [`use_service`](Self::use_service).
    pub fn use_arc(
        &self,
        path: &str,
        service: Arc<dyn Service>,
    ) -> Result<ServiceHandle, AppError> {
        let normalized = normalize_path(path);
        if normalized.is_empty() {
            return Err(AppError::InvalidPath(path.to_owned()));
        }

        let wrapped = WrappedService::wrap(service);
        let path: Arc<str> = Arc::from(normalized);

        {
            let mut services = self.inner.services.write();
            if services.contains_key(normalized) {
                match self.inner.config.duplicate_paths {
                    DuplicatePathPolicy::Reject => {
                        return Err(AppError::DuplicatePath(normalized.to_owned()));
                    }
                    DuplicatePathPolicy::Replace => {
                        self.inner.hooks.clear_scope(&Scope::service(normalized));
                        tracing::info!(path = normalized, "service replaced");
                    }
                }
            } else {
                tracing::info!(path = normalized, "service registered");
            }

            services.insert(
                normalized.to_owned(),
                ServiceEntry {
                    path: Arc::clone(&path),
                    service: Arc::clone(&wrapped),
                    set_up: false,
                },
            );
        }

        Ok(ServiceHandle::new(self.clone(), path, wrapped))
    }

    /// Returns the service registered under `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ServiceNotFound`] if no service is registered there.
    pub fn service(&self, path: &str) -> Result<ServiceHandle, AppError> {
        let normalized = normalize_path(path);
        let services = self.inner.services.read();
        let entry = services
            .get(normalized)
            .ok_or_else(|| AppError::ServiceNotFound(normalized.to_owned()))?;

        Ok(ServiceHandle::new(
            self.clone(),
            Arc::clone(&entry.path),
            Arc::clone(&entry.service),
        ))
    }

    /// Removes the service under `path` along with its service-scope hooks.
    ///
    /// The removed service is not torn down.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ServiceNotFound`] if no service is registered there.
    pub fn unuse(&self, path: &str) -> Result<Arc<WrappedService>, AppError> {
        let normalized = normalize_path(path);
        let entry = self
            .inner
            .services
            .write()
            .shift_remove(normalized)
            .ok_or_else(|| AppError::ServiceNotFound(normalized.to_owned()))?;

        self.inner.hooks.clear_scope(&Scope::service(normalized));
        tracing::info!(path = normalized, "service removed");
        Ok(entry.service)
    }

    /// Runs `f` while `service` is still the one registered under `path`.
    ///
    /// The services lock is held for the duration of `f`, so a concurrent
    /// `unuse` or replacement either happens before the check or after `f`.
    pub(crate) fn while_registered<T>(
        &self,
        path: &str,
        service: &Arc<WrappedService>,
        f: impl FnOnce() -> T,
    ) -> Result<T, AppError> {
        let services = self.inner.services.read();
        match services.get(path) {
            Some(entry) if Arc::ptr_eq(&entry.service, service) => Ok(f()),
            _ => Err(AppError::ServiceNotFound(path.to_owned())),
        }
    }

    /// Returns true if a service is registered under `path`.
    #[must_use]
    pub fn has_service(&self, path: &str) -> bool {
        self.inner.services.read().contains_key(normalize_path(path))
    }

    /// Returns the registered paths in registration order.
    #[must_use]
    pub fn service_paths(&self) -> Vec<String> {
        self.inner.services.read().keys().cloned().collect()
    }

    /// Calls `method` on the service at `path` through the hook pipeline.
    ///
    /// This is the entry point for transports.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ServiceNotFound`] or [`AppError::MethodNotFound`]
    /// if the call cannot be routed, otherwise the pipeline's terminal error.
    pub async fn dispatch(
        &self,
        path: &str,
        method: impl Into<Method>,
        id: Option<Id>,
        data: Option<Value>,
        params: Params,
    ) -> Result<Value, DispatchError> {
        let method = method.into();
        tracing::debug!(path, %method, "dispatch");
        self.service(path)?.call(method, id, data, params).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Hooks
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers application-scope hooks. They apply to every service.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidHook`] if a hook selects no method.
    pub fn hooks(&self, map: HookMap) -> Result<&Self, AppError> {
        for entry in map.into_entries() {
            self.inner
                .hooks
                .register_arc(Scope::App, entry.phase, entry.methods, entry.hook)?;
        }
        Ok(self)
    }

    /// Registers one application-scope hook.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidHook`] if `methods` selects no method.
    pub fn register_hook(
        &self,
        phase: Phase,
        methods: impl Into<MethodFilter>,
        hook: impl Hook,
    ) -> Result<&Self, AppError> {
        self.inner
            .hooks
            .register(Scope::App, phase, methods.into(), hook)?;
        Ok(self)
    }

    /// The hook registry of this application.
    #[must_use]
    pub fn hook_registry(&self) -> &HookRegistry {
        &self.inner.hooks
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    /// Subscribes to service events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ServiceEvent> {
        self.inner.events.subscribe()
    }

    /// The event bus of this application.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settings and resources
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns a copy of the setting under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.settings.read().get(key).cloned()
    }

    /// Sets a setting, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.settings.write().insert(key.into(), value)
    }

    /// Returns a snapshot of all settings.
    #[must_use]
    pub fn settings(&self) -> Map<String, Value> {
        self.inner.settings.read().clone()
    }

    /// Stores a shared typed value, replacing any value of the same type.
    pub fn insert_resource<R: Send + Sync + 'static>(&self, resource: R) {
        self.inner
            .resources
            .write()
            .insert(TypeId::of::<R>(), Arc::new(resource));
    }

    /// Returns the shared value of type `R`.
    #[must_use]
    pub fn resource<R: Send + Sync + 'static>(&self) -> Option<Arc<R>> {
        let resources = self.inner.resources.read();
        let resource = Arc::clone(resources.get(&TypeId::of::<R>())?);
        resource.downcast::<R>().ok()
    }

    /// Returns true if a value of type `R` is stored.
    #[must_use]
    pub fn contains_resource<R: Send + Sync + 'static>(&self) -> bool {
        self.inner.resources.read().contains_key(&TypeId::of::<R>())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Plugins and lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds plugins, running their `build` immediately in order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Plugin`] if a unique plugin is added twice, or the
    /// error a plugin's `build` returned.
    pub fn configure<P: Plugins>(&self, plugins: P) -> Result<&Self, AppError> {
        plugins.add_to_app(self)?;
        Ok(self)
    }

    /// Returns true if a plugin of type `P` has been added.
    #[must_use]
    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.inner.plugins.lock().ids.contains(&PluginId::of::<P>())
    }

    pub(crate) fn add_plugin_boxed(&self, boxed: BoxedPlugin) -> Result<(), AppError> {
        {
            let mut state = self.inner.plugins.lock();
            if boxed.plugin.is_unique() && state.ids.contains(&boxed.id) {
                return Err(AppError::plugin(
                    boxed.name(),
                    "plugin is unique and was already added",
                ));
            }
            state.ids.insert(boxed.id);
        }

        // Built without the lock held: plugins may configure other plugins.
        if let Err(err) = boxed.plugin.build(self) {
            let mut state = self.inner.plugins.lock();
            if !state.entries.iter().any(|p| p.id == boxed.id) {
                state.ids.remove(&boxed.id);
            }
            return Err(err);
        }

        tracing::debug!(plugin = boxed.name(), "plugin built");
        self.inner.plugins.lock().entries.push(boxed);
        Ok(())
    }

    /// Readies plugins and sets up services.
    ///
    /// Each plugin's `ready` runs once, in order of addition, and each
    /// service's `setup` runs once, in registration order. Calling `setup`
    /// again after adding more plugins or services readies and sets up just
    /// those.
    ///
    /// # Errors
    ///
    /// Returns the first plugin error, or [`AppError::Lifecycle`] for the first
    /// service whose `setup` fails. The failing plugin or service, and every
    /// one after it, is retried by calling `setup` again.
    pub async fn setup(&self) -> Result<(), AppError> {
        let (start, plugins): (usize, Vec<Arc<dyn Plugin>>) = {
            let mut state = self.inner.plugins.lock();
            let start = state.readied;
            state.readied = state.entries.len();
            let plugins = state
                .entries
                .iter()
                .skip(start)
                .map(|p| Arc::clone(&p.plugin))
                .collect();
            (start, plugins)
        };
        for (offset, plugin) in plugins.iter().enumerate() {
            if let Err(err) = plugin.ready(self) {
                // Release the claim on this and every later plugin.
                let mut state = self.inner.plugins.lock();
                state.readied = state.readied.min(start + offset);
                return Err(err);
            }
            tracing::debug!(plugin = plugin.name(), "plugin ready");
        }

        let pending: Vec<(Arc<str>, Arc<WrappedService>)> = {
            let mut services = self.inner.services.write();
            services
                .values_mut()
                .filter(|entry| !entry.set_up)
                .map(|entry| {
                    entry.set_up = true;
                    (Arc::clone(&entry.path), Arc::clone(&entry.service))
                })
                .collect()
        };

        for (index, (path, service)) in pending.iter().enumerate() {
            if let Err(source) = service.setup(path).await {
                // Release the claim on this and every later service.
                for (path, _) in &pending[index..] {
                    self.mark_set_up(path, false);
                }
                return Err(AppError::Lifecycle {
                    path: path.to_string(),
                    stage: "setup",
                    source,
                });
            }
            tracing::info!(path = %path, "service set up");
        }
        Ok(())
    }

    /// Tears down set-up services in reverse registration order, then cleans
    /// up plugins in reverse order of addition.
    ///
    /// Every service is torn down even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Lifecycle`] for the first service whose `teardown`
    /// failed.
    pub async fn teardown(&self) -> Result<(), AppError> {
        let set_up: Vec<(Arc<str>, Arc<WrappedService>)> = {
            let mut services = self.inner.services.write();
            services
                .values_mut()
                .rev()
                .filter(|entry| entry.set_up)
                .map(|entry| {
                    entry.set_up = false;
                    (Arc::clone(&entry.path), Arc::clone(&entry.service))
                })
                .collect()
        };

        let mut first_error = None;
        for (path, service) in set_up {
            match service.teardown(&path).await {
                Ok(()) => tracing::info!(path = %path, "service torn down"),
                Err(source) => {
                    tracing::warn!(path = %path, error = %source, "service teardown failed");
                    if first_error.is_none() {
                        first_error = Some(AppError::Lifecycle {
                            path: path.to_string(),
                            stage: "teardown",
                            source,
                        });
                    }
                }
            }
        }

        let plugins: Vec<Arc<dyn Plugin>> = {
            let mut state = self.inner.plugins.lock();
            state.readied = 0;
            state
                .entries
                .iter()
                .rev()
                .map(|p| Arc::clone(&p.plugin))
                .collect()
        };
        for plugin in plugins {
            plugin.cleanup(self);
        }

        first_error.map_or(Ok(()), Err)
    }

    fn mark_set_up(&self, path: &str, set_up: bool) {
        if let Some(entry) = self.inner.services.write().get_mut(path) {
            entry.set_up = set_up;
        }
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("services", &self.service_paths())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
