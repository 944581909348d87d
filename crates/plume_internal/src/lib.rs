//! # Plume Internal Library
//!
//! Re-exports the core Plume crates for convenience.

/// Layer 1: The service contract.
pub use plume_service;

/// Layer 2: Hook pipeline and application registry.
pub use plume_app;

/// Layer 3: Infrastructure plugins.
pub use plume_core_plugins;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use plume_app::prelude::*;
    pub use plume_core_plugins::{
        AppInfo, AppInfoPlugin, DefaultPlugins, MinimalPlugins, TracingConfig, TracingFormat,
        TracingPlugin,
    };
    pub use plume_service::prelude::*;
}
