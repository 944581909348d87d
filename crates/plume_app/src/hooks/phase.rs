//! Hook phases, scopes and method selectors.

use core::fmt;
use core::str::FromStr;

use plume_service::Method;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Phase
// ─────────────────────────────────────────────────────────────────────────────

/// Stage of a call at which a hook runs.
///
/// A call moves forward only: `Before → After`, or `Before/After → Error`.
/// The single backward step, `Error → After`, happens when an error hook
/// recovers the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Before the service method runs.
    Before,
    /// After the service method (or a short-circuiting hook) produced a result.
    After,
    /// After a failure anywhere in the call.
    Error,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Phase; 3] = [Phase::Before, Phase::After, Phase::Error];

    /// Returns the lowercase phase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Before => "before",
            Phase::After => "after",
            Phase::Error => "error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Phase::Before),
            "after" => Ok(Phase::After),
            "error" => Ok(Phase::Error),
            other => Err(AppError::InvalidPhase(other.to_owned())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scope
// ─────────────────────────────────────────────────────────────────────────────

/// Where a hook is registered.
///
/// App-scope hooks wrap service-scope hooks: they run first in `before` and
/// last in `after` and `error`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Applies to every service of the application.
    App,
    /// Applies to the service registered at this (normalized) path.
    Service(String),
}

impl Scope {
    /// Creates a service scope.
    #[must_use]
    pub fn service(path: impl Into<String>) -> Self {
        Scope::Service(path.into())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::App => f.write_str("application"),
            Scope::Service(path) => write!(f, "service '{path}'"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MethodFilter
// ─────────────────────────────────────────────────────────────────────────────

/// Selects the methods a hook applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MethodFilter {
    /// Every method, standard and custom.
    #[default]
    All,
    /// Only the listed methods.
    Only(Vec<Method>),
}

impl MethodFilter {
    /// Creates a filter for the given methods.
    #[must_use]
    pub fn only<I, M>(methods: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Method>,
    {
        MethodFilter::Only(methods.into_iter().map(Into::into).collect())
    }

    /// Returns true if the filter selects `method`.
    #[must_use]
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            MethodFilter::All => true,
            MethodFilter::Only(methods) => methods.contains(method),
        }
    }

    /// Returns the explicitly listed methods, or `None` for [`All`](Self::All).
    #[must_use]
    pub fn methods(&self) -> Option<&[Method]> {
        match self {
            MethodFilter::All => None,
            MethodFilter::Only(methods) => Some(methods),
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        MethodFilter::Only(vec![method])
    }
}

impl From<&str> for MethodFilter {
    fn from(name: &str) -> Self {
        if name == "all" {
            MethodFilter::All
        } else {
            MethodFilter::Only(vec![Method::from(name)])
        }
    }
}
