//! The service contract for Plume (Layer 1).
//!
//! `plume_service` defines what a data or logic provider must look like to be
//! mounted on a Plume application:
//!
//! - [`Method`] - The closed set of CRUD verbs plus named custom methods
//! - [`Id`] - Record identifiers
//! - [`Params`] - Caller-supplied call options
//! - [`ServiceError`] - Method errors with status codes
//! - [`Service`] - The async trait services implement
//!
//! # Architecture
//!
//! This crate is Layer 1 of the Plume architecture:
//!
//! - **Layer 1** (`plume_service`): The service contract (this crate)
//! - **Layer 2** (`plume_app`): Hook pipeline, service wrapper and application registry
//! - **Layer 3** (`plume_core_plugins`): Infrastructure plugins
//!
//! Services depend only on this crate, never on the application.

/// Method errors.
pub mod error;

/// Record identifiers.
pub mod id;

/// Service method identifiers.
pub mod method;

/// Call options.
pub mod params;

/// The service trait.
pub mod service;

pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use id::Id;
pub use method::Method;
pub use params::Params;
pub use service::{Service, call_method};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::error::*;
    pub use crate::id::*;
    pub use crate::method::*;
    pub use crate::params::*;
    pub use crate::service::*;
}
