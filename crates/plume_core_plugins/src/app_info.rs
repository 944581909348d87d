//! Application information plugin and resources.
//!
//! Provides [`AppInfoPlugin`] which registers build metadata as an
//! application resource.
//!
//! # Example
//!
//! ```
//! use plume_app::Application;
//! use plume_core_plugins::{AppInfo, AppInfoPlugin};
//!
//! let app = Application::new();
//! app.configure(AppInfoPlugin).unwrap();
//!
//! let info = app.resource::<AppInfo>().unwrap();
//! assert!(!info.version.is_empty());
//! ```

use plume_app::{AppError, Application, Plugin};
use serde::Serialize;

/// Application build information.
///
/// Read-only resource, available through [`Application::resource`] once
/// [`AppInfoPlugin`] is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppInfo {
    /// Framework version string.
    pub version: &'static str,
    /// Whether the application was compiled in debug mode.
    pub debug: bool,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            debug: cfg!(debug_assertions),
        }
    }
}

/// Registers [`AppInfo`] as an application resource.
///
/// # Resources Provided
///
/// | Resource | Description |
/// |----------|-------------|
/// | [`AppInfo`] | Framework version and debug flag |
#[derive(Debug, Clone, Copy, Default)]
pub struct AppInfoPlugin;

impl Plugin for AppInfoPlugin {
    fn build(&self, app: &Application) -> Result<(), AppError> {
        app.insert_resource(AppInfo::default());
        Ok(())
    }

    fn ready(&self, app: &Application) -> Result<(), AppError> {
        if let Some(info) = app.resource::<AppInfo>() {
            tracing::info!(version = info.version, debug = info.debug, "plume application ready");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "AppInfoPlugin"
    }
}
