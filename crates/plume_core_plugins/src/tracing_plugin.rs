//! Tracing and observability plugin.
//!
//! Provides [`TracingPlugin`] which configures the `tracing` subscriber and
//! exposes its configuration as an application resource.
//!
//! # Lifecycle
//!
//! - **`build()`** inserts the [`TracingConfig`] resource so hooks and other
//!   plugins can read the intended configuration.
//! - **`ready()`** installs the tracing subscriber on the next
//!   [`Application::setup`]. If a global subscriber is already installed the
//!   existing one is kept.
//!
//! # Example
//!
//! ```
//! use plume_app::Application;
//! use plume_core_plugins::{TracingConfig, TracingFormat, TracingPlugin};
//! use tracing::Level;
//!
//! let app = Application::new();
//! app.configure(
//!     TracingPlugin::default()
//!         .with_level(Level::DEBUG)
//!         .with_format(TracingFormat::Compact),
//! )
//! .unwrap();
//!
//! let config = app.resource::<TracingConfig>().unwrap();
//! assert_eq!(config.level, Level::DEBUG);
//! ```

use plume_app::{AppError, Application, Plugin};
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig Resource
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing configuration resource.
///
/// Hooks can read it through `ctx.app().resource::<TracingConfig>()` to skip
/// expensive diagnostics when the level would filter them out anyway.
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    /// The configured log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing and logging plugin.
///
/// Installs a [`tracing_subscriber`] registry with an [`EnvFilter`] and a
/// formatting layer. Every service call already runs inside a
/// `service.call` span with `path` and `method` fields; enable span events to
/// see call boundaries in the output.
///
/// # Resources Provided
///
/// | Resource | Description |
/// |----------|-------------|
/// | [`TracingConfig`] | Tracing configuration (read-only) |
///
/// # Configuration Options
///
/// ```
/// use plume_core_plugins::{TracingFormat, TracingPlugin};
/// use tracing::Level;
///
/// // Development: pretty output with call boundaries
/// let dev_plugin = TracingPlugin::default()
///     .with_level(Level::DEBUG)
///     .with_format(TracingFormat::Pretty)
///     .with_span_events(true);
///
/// // Production: JSON output for log aggregation
/// let prod_plugin = TracingPlugin::default()
///     .with_level(Level::INFO)
///     .with_format(TracingFormat::Json)
///     .with_env_filter("plume_app=info,my_service=debug");
/// ```
#[derive(Debug, Clone)]
pub struct TracingPlugin {
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Environment filter (e.g., `plume_app=debug,my_service=trace`).
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingPlugin {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingPlugin {
    /// Creates a new `TracingPlugin` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`. An invalid filter falls back
    /// to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        }
    }

    /// Installs the global subscriber. Returns false if one was already set.
    fn install(&self) -> bool {
        let registry = tracing_subscriber::registry().with(self.env_filter());
        let layer = tracing_subscriber::fmt::layer().with_span_events(self.span_events());

        match self.format {
            TracingFormat::Pretty => registry.with(layer.pretty()).try_init().is_ok(),
            TracingFormat::Compact => registry.with(layer.compact()).try_init().is_ok(),
            TracingFormat::Json => registry.with(layer.json()).try_init().is_ok(),
        }
    }
}

impl Plugin for TracingPlugin {
    fn build(&self, app: &Application) -> Result<(), AppError> {
        app.insert_resource(TracingConfig {
            level: self.level,
            format: self.format,
        });
        Ok(())
    }

    fn ready(&self, _app: &Application) -> Result<(), AppError> {
        if self.install() {
            tracing::info!(
                level = %self.level,
                format = ?self.format,
                "TracingPlugin initialized"
            );
        } else {
            tracing::debug!("global subscriber already set, keeping it");
        }
        Ok(())
    }

    fn cleanup(&self, _app: &Application) {
        tracing::info!("TracingPlugin shutting down");
    }

    fn name(&self) -> &str {
        "TracingPlugin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_format_default_is_pretty() {
        let format = TracingFormat::default();
        assert_eq!(format, TracingFormat::Pretty);
    }

    #[test]
    fn tracing_format_parses_lowercase() {
        let format: TracingFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, TracingFormat::Json);
    }

    #[test]
    fn tracing_plugin_default_level_is_info() {
        let plugin = TracingPlugin::default();
        assert_eq!(plugin.level, Level::INFO);
    }

    #[test]
    fn tracing_plugin_with_level() {
        let plugin = TracingPlugin::new().with_level(Level::DEBUG);
        assert_eq!(plugin.level, Level::DEBUG);
    }

    #[test]
    fn tracing_plugin_with_env_filter() {
        let plugin = TracingPlugin::new().with_env_filter("plume_app=debug");
        assert_eq!(plugin.env_filter, Some("plume_app=debug".to_string()));
    }

    #[test]
    fn tracing_plugin_with_span_events() {
        let plugin = TracingPlugin::new().with_span_events(true);
        assert!(plugin.span_events);
        assert_eq!(plugin.span_events(), FmtSpan::ENTER | FmtSpan::EXIT);
    }

    #[test]
    fn tracing_plugin_registers_resource() {
        let app = Application::new();
        app.configure(TracingPlugin::default().with_format(TracingFormat::Json))
            .unwrap();

        let config = app.resource::<TracingConfig>().unwrap();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, TracingFormat::Json);
    }

    #[tokio::test]
    async fn repeated_install_is_tolerated() {
        let first = Application::new();
        first.configure(TracingPlugin::default()).unwrap();
        first.setup().await.unwrap();

        let second = Application::new();
        second.configure(TracingPlugin::default()).unwrap();
        second.setup().await.unwrap();
        second.teardown().await.unwrap();
    }
}
