//! Error types for application setup and dispatch.

use plume_service::{ErrorKind, Method, ServiceError};

/// Errors raised by the registration and lifecycle APIs.
///
/// These indicate programmer misuse and surface immediately to the caller of
/// the registration API. Method failures are [`ServiceError`]s instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AppError {
    /// A phase name did not match `before`, `after` or `error`.
    #[error("invalid hook phase '{0}': expected 'before', 'after' or 'error'")]
    InvalidPhase(String),

    /// A hook registration was rejected.
    #[error("invalid hook registration on {scope}: {reason}")]
    InvalidHook {
        /// The scope the hook was registered on.
        scope: String,
        /// Why the registration was rejected.
        reason: String,
    },

    /// The service does not expose the requested method.
    #[error("method '{method}' is not available on service '{path}'")]
    MethodNotFound {
        /// The service path.
        path: String,
        /// The requested method.
        method: Method,
    },

    /// No service is registered at the path.
    #[error("no service is registered at '{0}'")]
    ServiceNotFound(String),

    /// A service is already registered at the path.
    #[error("a service is already registered at '{0}'")]
    DuplicatePath(String),

    /// The path is empty after normalization.
    #[error("invalid service path '{0}'")]
    InvalidPath(String),

    /// A plugin could not be configured.
    #[error("plugin '{name}' failed: {reason}")]
    Plugin {
        /// The plugin name.
        name: String,
        /// The failure reason.
        reason: String,
    },

    /// A service's `setup` or `teardown` failed.
    #[error("{stage} of service '{path}' failed: {source}")]
    Lifecycle {
        /// The service path.
        path: String,
        /// `"setup"` or `"teardown"`.
        stage: &'static str,
        /// The service's error.
        source: ServiceError,
    },
}

impl AppError {
    /// Creates an [`InvalidHook`](Self::InvalidHook) error.
    pub fn invalid_hook(scope: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidHook {
            scope: scope.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a [`Plugin`](Self::Plugin) error.
    pub fn plugin(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Plugin {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Outcome error of a dispatched call.
///
/// Either the call could not be routed ([`AppError`]) or the hook pipeline
/// finished with a (possibly hook-enriched) [`ServiceError`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    /// The call could not be routed to a service method.
    #[error(transparent)]
    App(#[from] AppError),

    /// The pipeline finished with an error.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl DispatchError {
    /// Returns the service error, if the pipeline produced one.
    #[must_use]
    pub fn as_service_error(&self) -> Option<&ServiceError> {
        match self {
            DispatchError::Service(err) => Some(err),
            DispatchError::App(_) => None,
        }
    }

    /// Converts into a [`ServiceError`] suitable for a transport response.
    ///
    /// Unknown services map to `NotFound`, unknown methods to
    /// `MethodNotAllowed`, and any other setup error to `GeneralError`.
    #[must_use]
    pub fn into_service_error(self) -> ServiceError {
        match self {
            DispatchError::Service(err) => err,
            DispatchError::App(err @ AppError::ServiceNotFound(_)) => {
                ServiceError::new(ErrorKind::NotFound, err.to_string())
            }
            DispatchError::App(err @ AppError::MethodNotFound { .. }) => {
                ServiceError::new(ErrorKind::MethodNotAllowed, err.to_string())
            }
            DispatchError::App(err) => ServiceError::general(err.to_string()),
        }
    }

    /// Status code for transports.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.clone().into_service_error().code()
    }
}
