//! Hooks: interceptors that run around service method calls.
//!
//! # Overview
//!
//! A hook is bound to a [`Phase`] (`before`, `after` or `error`), a
//! [`MethodFilter`] and a [`Scope`] (the whole application or one service).
//! Hooks are stored in a [`HookRegistry`] and executed by the [`Pipeline`].
//!
//! # Ordering
//!
//! Within one scope and phase, hooks run in registration order. Across
//! scopes, application hooks wrap service hooks:
//!
//! | Phase    | Order               |
//! |----------|---------------------|
//! | `before` | app, then service   |
//! | `after`  | service, then app   |
//! | `error`  | service, then app   |
//!
//! # Example
//!
//! ```
//! use plume_app::hooks::{HookMap, async_hook, hook_fn};
//! use plume_service::{Method, ServiceError};
//!
//! let hooks = HookMap::new()
//!     .before(Method::Create, hook_fn(|ctx| match &ctx.data {
//!         Some(data) if data.get("text").is_some() => Ok(()),
//!         _ => Err(ServiceError::bad_request("text is required")),
//!     }))
//!     .error_all(async_hook(|ctx| {
//!         Box::pin(async move {
//!             tracing::warn!(path = ctx.path(), "call failed");
//!             Ok(None)
//!         })
//!     }));
//! # let _ = hooks;
//! ```

mod hook;
mod map;
mod phase;
mod pipeline;
mod registry;

pub use hook::{AsyncFnHook, BoxFuture, FnHook, Hook, HookResult, async_hook, hook_fn};
pub use map::HookMap;
pub(crate) use map::HookMapEntry;
pub use phase::{MethodFilter, Phase, Scope};
pub use pipeline::Pipeline;
pub use registry::HookRegistry;
