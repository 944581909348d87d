//! Plugins: reusable bundles of application configuration.
//!
//! A plugin configures an [`Application`]: it registers services, hooks,
//! settings and resources. Plugins are applied with
//! [`Application::configure`], which runs [`Plugin::build`] immediately.
//! [`Plugin::ready`] runs once on the next [`Application::setup`] and
//! [`Plugin::cleanup`] on [`Application::teardown`].
//!
//! # Example
//!
//! ```
//! use plume_app::{AppError, Application, Plugin};
//! use serde_json::json;
//!
//! struct Pagination {
//!     default: u64,
//! }
//!
//! impl Plugin for Pagination {
//!     fn build(&self, app: &Application) -> Result<(), AppError> {
//!         app.set("paginate", json!({ "default": self.default }));
//!         Ok(())
//!     }
//! }
//!
//! let app = Application::new();
//! app.configure(Pagination { default: 10 }).unwrap();
//! assert_eq!(app.get("paginate"), Some(json!({ "default": 10 })));
//! ```

use core::any::TypeId;
use std::sync::Arc;

use crate::application::Application;
use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// PluginId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a plugin type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginId {
    type_id: TypeId,
    type_name: &'static str,
}

impl PluginId {
    /// Returns the identifier of plugin type `P`.
    #[must_use]
    pub fn of<P: Plugin>() -> Self {
        Self {
            type_id: TypeId::of::<P>(),
            type_name: core::any::type_name::<P>(),
        }
    }

    /// Returns the type name of the plugin.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A unit of application configuration.
pub trait Plugin: Send + Sync + 'static {
    /// Configures the application. Runs once, when the plugin is added.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin cannot configure the application, for
    /// example because a service path it registers is taken.
    fn build(&self, app: &Application) -> Result<(), AppError>;

    /// Runs on the next [`Application::setup`] after the plugin is built.
    ///
    /// If it fails, the next `setup` calls it again.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin cannot start.
    fn ready(&self, _app: &Application) -> Result<(), AppError> {
        Ok(())
    }

    /// Runs on [`Application::teardown`], in reverse order of addition.
    fn cleanup(&self, _app: &Application) {}

    /// Returns the plugin name, used in logs and errors.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Returns true if the plugin may be added only once.
    fn is_unique(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins Trait (for configure polymorphism)
// ─────────────────────────────────────────────────────────────────────────────

/// Anything [`Application::configure`] accepts: a single plugin or a group.
pub trait Plugins {
    /// Adds the plugin(s) to `app`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while adding a plugin.
    fn add_to_app(self, app: &Application) -> Result<(), AppError>;
}

impl<P: Plugin> Plugins for P {
    fn add_to_app(self, app: &Application) -> Result<(), AppError> {
        let id = PluginId::of::<P>();
        app.add_plugin_boxed(BoxedPlugin {
            id,
            plugin: Arc::new(self),
        })
    }
}

impl Plugins for PluginGroupBuilder {
    fn add_to_app(self, app: &Application) -> Result<(), AppError> {
        for boxed in self.plugins {
            app.add_plugin_boxed(boxed)?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginGroup Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A named bundle of plugins.
pub trait PluginGroup {
    /// Returns the plugins of the group, in the order they should be added.
    fn build(self) -> PluginGroupBuilder;
}

// ─────────────────────────────────────────────────────────────────────────────
// BoxedPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// A type-erased plugin with its identity.
pub(crate) struct BoxedPlugin {
    pub(crate) id: PluginId,
    pub(crate) plugin: Arc<dyn Plugin>,
}

impl BoxedPlugin {
    pub(crate) fn name(&self) -> &str {
        self.plugin.name()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PluginGroupBuilder
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered list of plugins produced by a [`PluginGroup`].
#[derive(Default)]
pub struct PluginGroupBuilder {
    plugins: Vec<BoxedPlugin>,
}

impl PluginGroupBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Adds a plugin to the end of the group.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "This is a builder method, not std::ops::Add"
    )]
    pub fn add<P: Plugin>(mut self, plugin: P) -> Self {
        self.plugins.push(BoxedPlugin {
            id: PluginId::of::<P>(),
            plugin: Arc::new(plugin),
        });
        self
    }

    /// Removes a plugin from the group by type.
    ///
    /// If the plugin is not found, this is a no-op.
    #[must_use]
    pub fn disable<P: Plugin>(mut self) -> Self {
        let target = PluginId::of::<P>();
        self.plugins.retain(|p| p.id != target);
        self
    }

    /// Returns true if the group contains a plugin of type `P`.
    #[must_use]
    pub fn contains<P: Plugin>(&self) -> bool {
        let target = PluginId::of::<P>();
        self.plugins.iter().any(|p| p.id == target)
    }

    /// Returns the number of plugins in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if the group contains no plugins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
