//! Batch hook registration.

use std::sync::Arc;

use plume_service::Method;

use super::hook::Hook;
use super::phase::{MethodFilter, Phase};
use crate::error::AppError;

/// One pending registration.
pub(crate) struct HookMapEntry {
    pub(crate) phase: Phase,
    pub(crate) methods: MethodFilter,
    pub(crate) hook: Arc<dyn Hook>,
}

/// A batch of hook registrations for one scope.
///
/// Passed to [`Application::hooks`](crate::Application::hooks) or
/// [`ServiceHandle::hooks`](crate::ServiceHandle::hooks), which register the
/// hooks in the order they were added here.
///
/// ```
/// use plume_app::hooks::{HookMap, hook_fn};
/// use plume_service::{Method, ServiceError};
///
/// let map = HookMap::new()
///     .before_all(hook_fn(|ctx| {
///         ctx.params.set("seen", true.into());
///         Ok(())
///     }))
///     .before(Method::Remove, hook_fn(|_| Err(ServiceError::forbidden("read only"))));
///
/// assert_eq!(map.len(), 2);
/// ```
#[derive(Default)]
pub struct HookMap {
    entries: Vec<HookMapEntry>,
}

impl HookMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a hook for `phase` and the methods selected by `methods`.
    #[must_use]
    pub fn on(mut self, phase: Phase, methods: impl Into<MethodFilter>, hook: impl Hook) -> Self {
        self.entries.push(HookMapEntry {
            phase,
            methods: methods.into(),
            hook: Arc::new(hook),
        });
        self
    }

    /// Adds a hook for a phase given by name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidPhase`] if `phase` is not `before`, `after`
    /// or `error`.
    pub fn try_on(
        self,
        phase: &str,
        methods: impl Into<MethodFilter>,
        hook: impl Hook,
    ) -> Result<Self, AppError> {
        let phase = phase.parse::<Phase>()?;
        Ok(self.on(phase, methods, hook))
    }

    /// Adds a `before` hook for every method.
    #[must_use]
    pub fn before_all(self, hook: impl Hook) -> Self {
        self.on(Phase::Before, MethodFilter::All, hook)
    }

    /// Adds a `before` hook for one method.
    #[must_use]
    pub fn before(self, method: impl Into<Method>, hook: impl Hook) -> Self {
        self.on(Phase::Before, method.into(), hook)
    }

    /// Adds an `after` hook for every method.
    #[must_use]
    pub fn after_all(self, hook: impl Hook) -> Self {
        self.on(Phase::After, MethodFilter::All, hook)
    }

    /// Adds an `after` hook for one method.
    #[must_use]
    pub fn after(self, method: impl Into<Method>, hook: impl Hook) -> Self {
        self.on(Phase::After, method.into(), hook)
    }

    /// Adds an `error` hook for every method.
    #[must_use]
    pub fn error_all(self, hook: impl Hook) -> Self {
        self.on(Phase::Error, MethodFilter::All, hook)
    }

    /// Adds an `error` hook for one method.
    #[must_use]
    pub fn error(self, method: impl Into<Method>, hook: impl Hook) -> Self {
        self.on(Phase::Error, method.into(), hook)
    }

    /// Returns the number of pending registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map holds no registrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Methods named explicitly by any entry.
    pub(crate) fn named_methods(&self) -> impl Iterator<Item = &Method> {
        self.entries
            .iter()
            .filter_map(|entry| entry.methods.methods())
            .flatten()
    }

    pub(crate) fn into_entries(self) -> Vec<HookMapEntry> {
        self.entries
    }
}
