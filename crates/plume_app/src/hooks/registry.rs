//! Storage of ordered hook chains.
//!
//! The [`HookRegistry`] keeps one append-only chain per `(scope, phase)` pair.
//! Each entry carries a [`MethodFilter`]; resolving a chain for a method
//! yields the matching hooks in insertion order.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use plume_service::Method;

use super::hook::Hook;
use super::phase::{MethodFilter, Phase, Scope};
use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// HookEntry
// ─────────────────────────────────────────────────────────────────────────────

/// Entry in a hook chain.
struct HookEntry {
    /// Methods this hook applies to.
    methods: MethodFilter,
    /// The hook itself.
    hook: Arc<dyn Hook>,
}

// ─────────────────────────────────────────────────────────────────────────────
// HookRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Registry of hooks, organized by scope and phase.
///
/// # Thread Safety
///
/// The registry uses interior mutability via [`RwLock`]. Registration is
/// expected during setup; during dispatch the registry is only read, and
/// [`resolve`](Self::resolve) copies the matching hooks out so that no lock
/// is held while a hook runs.
#[derive(Default)]
pub struct HookRegistry {
    /// Maps `(scope, phase)` to its chain.
    chains: RwLock<HashMap<(Scope, Phase), Vec<HookEntry>>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chains: RwLock::new(HashMap::new()),
        }
    }

    /// Appends `hook` to the chain for `scope` and `phase`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidHook`] if `methods` selects no method.
    pub fn register(
        &self,
        scope: Scope,
        phase: Phase,
        methods: MethodFilter,
        hook: impl Hook,
    ) -> Result<(), AppError> {
        self.register_arc(scope, phase, methods, Arc::new(hook))
    }

    /// Appends an already shared hook to the chain for `scope` and `phase`.
    ///
    /// The same hook may be registered on several chains.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidHook`] if `methods` selects no method.
    pub fn register_arc(
        &self,
        scope: Scope,
        phase: Phase,
        methods: MethodFilter,
        hook: Arc<dyn Hook>,
    ) -> Result<(), AppError> {
        if methods.methods().is_some_and(<[Method]>::is_empty) {
            return Err(AppError::invalid_hook(
                &scope,
                format!("{phase} hook '{}' applies to no method", hook.name()),
            ));
        }

        tracing::trace!(%scope, %phase, hook = hook.name(), "hook registered");
        self.chains
            .write()
            .entry((scope, phase))
            .or_default()
            .push(HookEntry { methods, hook });
        Ok(())
    }

    /// Returns the hooks of one chain that apply to `method`, in insertion order.
    #[must_use]
    pub fn resolve(&self, scope: &Scope, phase: Phase, method: &Method) -> Vec<Arc<dyn Hook>> {
        let chains = self.chains.read();
        chains
            .get(&(scope.clone(), phase))
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.methods.matches(method))
                    .map(|entry| Arc::clone(&entry.hook))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the number of hooks registered on one chain.
    #[must_use]
    pub fn hook_count(&self, scope: &Scope, phase: Phase) -> usize {
        let chains = self.chains.read();
        chains.get(&(scope.clone(), phase)).map_or(0, Vec::len)
    }

    /// Drops every chain of `scope`.
    ///
    /// Used when a service path is re-registered with the replace policy.
    pub(crate) fn clear_scope(&self, scope: &Scope) {
        self.chains.write().retain(|(entry_scope, _), _| entry_scope != scope);
    }
}
