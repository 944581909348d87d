//! Application runtime for Plume (Layer 2).
//!
//! `plume_app` turns plain [`Service`](plume_service::Service) implementations
//! into hookable endpoints:
//!
//! - [`Application`] - Owns services, hooks, settings, resources and plugins
//! - [`hooks`] - Hook trait, registry and the pipeline executor
//! - [`HookContext`] - The mutable record of one in-flight call
//! - [`WrappedService`] / [`ServiceHandle`] - Hook-routed service access
//! - [`EventBus`] - Broadcast of `created`/`updated`/`patched`/`removed` events
//! - [`Plugin`] - Reusable bundles of configuration
//!
//! # Call flow
//!
//! ```text
//! dispatch(path, method, id, data, params)
//!   └─ ServiceHandle::call
//!        ├─ method exposed?          no → AppError::MethodNotFound
//!        ├─ before hooks             app → service
//!        ├─ service method           skipped if a before hook set `result`
//!        ├─ after hooks              service → app
//!        ├─ error hooks              service → app, on any failure
//!        └─ publish event            on success, if `ctx.event` is set
//! ```
//!
//! # Architecture
//!
//! This crate is Layer 2 of the Plume architecture:
//!
//! - **Layer 1** (`plume_service`): The service contract
//! - **Layer 2** (`plume_app`): Hook pipeline, service wrapper and application registry (this crate)
//! - **Layer 3** (`plume_core_plugins`): Infrastructure plugins

/// The application registry.
pub mod application;

/// Static application configuration.
pub mod config;

/// The per-call context.
pub mod context;

/// Setup and dispatch errors.
pub mod error;

/// Service event broadcast.
pub mod events;

/// Typed per-call extensions.
pub mod extensions;

pub mod hooks;

/// Plugin system.
pub mod plugin;

/// Service wrapper and handles.
pub mod wrapper;

pub use application::{Application, normalize_path};
pub use config::{AppConfig, DuplicatePathPolicy};
pub use context::HookContext;
pub use error::{AppError, DispatchError};
pub use events::{DEFAULT_EVENT_CAPACITY, EventBus, ServiceEvent};
pub use extensions::Extensions;
pub use hooks::{
    Hook, HookMap, HookRegistry, HookResult, MethodFilter, Phase, Pipeline, Scope, async_hook,
    hook_fn,
};
pub use plugin::{Plugin, PluginGroup, PluginGroupBuilder, PluginId, Plugins};
pub use wrapper::{ServiceHandle, WrappedService};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::application::*;
    pub use crate::config::*;
    pub use crate::context::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::extensions::*;
    pub use crate::hooks::*;
    pub use crate::plugin::*;
    pub use crate::wrapper::*;
}
