//! Static application configuration.
//!
//! [`AppConfig`] is fixed when the [`Application`](crate::Application) is
//! created and never changes while calls are in flight. It can be built in
//! code or deserialized:
//!
//! ```
//! use plume_app::{AppConfig, DuplicatePathPolicy, Phase};
//!
//! let config = AppConfig::from_json_str(
//!     r#"{ "duplicate_paths": "replace", "disabled_phases": ["after"] }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.duplicate_paths, DuplicatePathPolicy::Replace);
//! assert!(config.is_disabled(Phase::After));
//! assert!(config.emit_events);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::hooks::Phase;

/// What [`Application::use_service`](crate::Application::use_service) does
/// when the path is already registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePathPolicy {
    /// Fail with [`AppError::DuplicatePath`](crate::AppError::DuplicatePath).
    #[default]
    Reject,
    /// Replace the service and drop the hooks registered on its path.
    Replace,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Policy for registering a service on a taken path.
    pub duplicate_paths: DuplicatePathPolicy,
    /// Phases whose hooks are skipped for every call.
    pub disabled_phases: Vec<Phase>,
    /// Whether successful calls publish service events.
    pub emit_events: bool,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
    /// Initial application settings.
    pub settings: Map<String, Value>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            duplicate_paths: DuplicatePathPolicy::Reject,
            disabled_phases: Vec::new(),
            emit_events: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            settings: Map::new(),
        }
    }
}

impl AppConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if the JSON does not describe a
    /// configuration.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets the duplicate path policy.
    #[must_use]
    pub fn with_duplicate_paths(mut self, policy: DuplicatePathPolicy) -> Self {
        self.duplicate_paths = policy;
        self
    }

    /// Disables the hooks of `phase`.
    #[must_use]
    pub fn disable_phase(mut self, phase: Phase) -> Self {
        if !self.disabled_phases.contains(&phase) {
            self.disabled_phases.push(phase);
        }
        self
    }

    /// Enables or disables service events.
    #[must_use]
    pub fn with_events(mut self, enabled: bool) -> Self {
        self.emit_events = enabled;
        self
    }

    /// Sets the event channel capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Sets an initial setting.
    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    /// Returns true if hooks of `phase` are skipped.
    #[must_use]
    pub fn is_disabled(&self, phase: Phase) -> bool {
        self.disabled_phases.contains(&phase)
    }
}
