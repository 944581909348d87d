//! The service contract.
//!
//! A [`Service`] is a provider of async CRUD and custom methods. Implementors
//! override only the methods they support and list them in
//! [`Service::methods`]; every method left at its default body answers with a
//! [`NotImplemented`](crate::ErrorKind::NotImplemented) error.
//!
//! # Example
//!
//! ```
//! use async_trait::async_trait;
//! use plume_service::{Method, Params, Service, ServiceResult};
//! use serde_json::{Value, json};
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl Service for Echo {
//!     fn methods(&self) -> Vec<Method> {
//!         vec![Method::Create, Method::custom("ping")]
//!     }
//!
//!     async fn create(&self, data: Value, _params: &Params) -> ServiceResult {
//!         Ok(data)
//!     }
//!
//!     async fn call_custom(&self, name: &str, _data: Value, _params: &Params) -> ServiceResult {
//!         Ok(json!({ "pong": name }))
//!     }
//! }
//! ```

use async_trait::async_trait;
use downcast_rs::{DowncastSync, impl_downcast};
use serde_json::Value;

use crate::error::{ServiceError, ServiceResult};
use crate::id::Id;
use crate::method::Method;
use crate::params::Params;

/// A named provider of async methods.
///
/// Services are registered on an application under a path. The application
/// wraps them so that every call runs through the hook pipeline; the service
/// itself never sees hooks.
///
/// Services must be `Send + Sync`: distinct calls may run concurrently and any
/// state shared between them is the service's own to synchronize.
#[async_trait]
pub trait Service: DowncastSync {
    /// The methods this service exposes.
    ///
    /// Calls to any method not listed here are rejected before hooks run.
    fn methods(&self) -> Vec<Method>;

    /// Lists records.
    async fn find(&self, _params: &Params) -> ServiceResult {
        Err(ServiceError::not_implemented(&Method::Find))
    }

    /// Fetches a single record.
    async fn get(&self, _id: &Id, _params: &Params) -> ServiceResult {
        Err(ServiceError::not_implemented(&Method::Get))
    }

    /// Creates records.
    async fn create(&self, _data: Value, _params: &Params) -> ServiceResult {
        Err(ServiceError::not_implemented(&Method::Create))
    }

    /// Replaces a record.
    async fn update(&self, _id: Option<&Id>, _data: Value, _params: &Params) -> ServiceResult {
        Err(ServiceError::not_implemented(&Method::Update))
    }

    /// Merges data into records.
    async fn patch(&self, _id: Option<&Id>, _data: Value, _params: &Params) -> ServiceResult {
        Err(ServiceError::not_implemented(&Method::Patch))
    }

    /// Removes records.
    async fn remove(&self, _id: Option<&Id>, _params: &Params) -> ServiceResult {
        Err(ServiceError::not_implemented(&Method::Remove))
    }

    /// Runs a custom method declared in [`methods`](Self::methods).
    async fn call_custom(&self, name: &str, _data: Value, _params: &Params) -> ServiceResult {
        Err(ServiceError::not_implemented(&Method::custom(name)))
    }

    /// Called once when the owning application is set up.
    async fn setup(&self, _path: &str) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Called once when the owning application tears down.
    async fn teardown(&self, _path: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}

impl_downcast!(sync Service);

/// Invokes `method` on `service`, extracting arguments by method shape.
///
/// `get` requires an id; missing `data` is passed as `null`.
///
/// # Errors
///
/// Returns [`BadRequest`](crate::ErrorKind::BadRequest) when `get` is called
/// without an id, otherwise whatever the service method returns.
pub async fn call_method(
    service: &dyn Service,
    method: &Method,
    id: Option<&Id>,
    data: Option<Value>,
    params: &Params,
) -> ServiceResult {
    let data = data.unwrap_or(Value::Null);
    match method {
        Method::Find => service.find(params).await,
        Method::Get => {
            let id = id.ok_or_else(|| ServiceError::bad_request("'get' requires an id"))?;
            service.get(id, params).await
        }
        Method::Create => service.create(data, params).await,
        Method::Update => service.update(id, data, params).await,
        Method::Patch => service.patch(id, data, params).await,
        Method::Remove => service.remove(id, params).await,
        Method::Custom(name) => service.call_custom(name, data, params).await,
    }
}
