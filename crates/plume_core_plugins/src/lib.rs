//! Core infrastructure plugins for Plume.
//!
//! This crate provides foundational plugins that most Plume applications need:
//!
//! - [`AppInfoPlugin`] - Framework version and build information
//! - [`TracingPlugin`] - Logging and observability via the `tracing` crate
//! - [`DefaultPlugins`] - Convenient bundle of all infrastructure plugins
//!
//! # Example
//!
//! ```no_run
//! use plume_app::{Application, PluginGroup};
//! use plume_core_plugins::DefaultPlugins;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let app = Application::new();
//! app.configure(DefaultPlugins.build()).unwrap();
//! app.setup().await.unwrap();
//! # }
//! ```
//!
//! # Individual Plugin Usage
//!
//! For fine-grained control, add plugins individually:
//!
//! ```
//! use plume_app::Application;
//! use plume_core_plugins::{AppInfoPlugin, TracingPlugin};
//! use tracing::Level;
//!
//! let app = Application::new();
//! app.configure(AppInfoPlugin).unwrap();
//! app.configure(TracingPlugin::default().with_level(Level::DEBUG)).unwrap();
//! ```
//!
//! # Architecture
//!
//! This crate is Layer 3 of the Plume architecture:
//!
//! - **Layer 1** (`plume_service`): The service contract
//! - **Layer 2** (`plume_app`): Hook pipeline, service wrapper and application registry
//! - **Layer 3** (`plume_core_plugins`): Infrastructure plugins (this crate)

mod app_info;
mod tracing_plugin;

// Re-export plugins
pub use app_info::AppInfoPlugin;
pub use tracing_plugin::{TracingFormat, TracingPlugin};

// Re-export resources
pub use app_info::AppInfo;
pub use tracing_plugin::TracingConfig;

use plume_app::{PluginGroup, PluginGroupBuilder};

/// Default plugins for most Plume applications.
///
/// Includes:
/// - [`AppInfoPlugin`] - Build information
/// - [`TracingPlugin`] - Logging and observability
///
/// # Customization
///
/// Use the builder to drop a plugin, e.g. when the host process installs its
/// own subscriber:
///
/// ```
/// use plume_app::{Application, PluginGroup};
/// use plume_core_plugins::{DefaultPlugins, TracingPlugin};
///
/// let app = Application::new();
/// app.configure(DefaultPlugins.build().disable::<TracingPlugin>())
///     .unwrap();
/// assert!(!app.has_plugin::<TracingPlugin>());
/// ```
pub struct DefaultPlugins;

impl PluginGroup for DefaultPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new()
            .add(AppInfoPlugin)
            .add(TracingPlugin::default())
    }
}

/// Minimal plugins for headless or testing scenarios.
///
/// Includes only [`AppInfoPlugin`]. Does not install a subscriber, which
/// suits unit tests that don't need logging output.
pub struct MinimalPlugins;

impl PluginGroup for MinimalPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::new().add(AppInfoPlugin)
    }
}
