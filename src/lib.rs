//! A service runtime where CRUD services are wrapped in composable hook chains.
//!
//! Register a [`Service`](plume_service::Service) on an
//! [`Application`](plume_app::Application), attach `before`, `after` and
//! `error` hooks at application or service scope, then dispatch calls by path.

pub use plume_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use plume_internal::prelude::*;
}
