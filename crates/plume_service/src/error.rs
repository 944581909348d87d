//! Method errors.
//!
//! A [`ServiceError`] is what a service method or hook fails with. It is data:
//! the hook pipeline captures it into the call context and routes it through
//! the `error` hooks, which may enrich or recover from it.
//!
//! Each error has an [`ErrorKind`] that maps onto an HTTP-style status code so
//! transports can report it without inspecting messages.

use core::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::method::Method;

/// Classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed request data or params.
    BadRequest,
    /// The caller is not authenticated.
    NotAuthenticated,
    /// Payment required.
    PaymentError,
    /// The caller may not perform this call.
    Forbidden,
    /// The addressed record does not exist.
    NotFound,
    /// The method is not supported here.
    MethodNotAllowed,
    /// The requested representation is not available.
    NotAcceptable,
    /// The call took too long.
    Timeout,
    /// The call conflicts with current state.
    Conflict,
    /// A length is required.
    LengthRequired,
    /// Data was well-formed but semantically invalid.
    Unprocessable,
    /// Rate limited.
    TooManyRequests,
    /// Unclassified failure.
    GeneralError,
    /// The service does not implement the method.
    NotImplemented,
    /// An upstream dependency failed.
    BadGateway,
    /// The service is temporarily unavailable.
    Unavailable,
}

impl ErrorKind {
    /// Every kind, in status code order.
    pub const ALL: [ErrorKind; 16] = [
        ErrorKind::BadRequest,
        ErrorKind::NotAuthenticated,
        ErrorKind::PaymentError,
        ErrorKind::Forbidden,
        ErrorKind::NotFound,
        ErrorKind::MethodNotAllowed,
        ErrorKind::NotAcceptable,
        ErrorKind::Timeout,
        ErrorKind::Conflict,
        ErrorKind::LengthRequired,
        ErrorKind::Unprocessable,
        ErrorKind::TooManyRequests,
        ErrorKind::GeneralError,
        ErrorKind::NotImplemented,
        ErrorKind::BadGateway,
        ErrorKind::Unavailable,
    ];

    /// HTTP-style status code.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotAuthenticated => 401,
            ErrorKind::PaymentError => 402,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::NotAcceptable => 406,
            ErrorKind::Timeout => 408,
            ErrorKind::Conflict => 409,
            ErrorKind::LengthRequired => 411,
            ErrorKind::Unprocessable => 422,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::GeneralError => 500,
            ErrorKind::NotImplemented => 501,
            ErrorKind::BadGateway => 502,
            ErrorKind::Unavailable => 503,
        }
    }

    /// Looks up the kind for a status code.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// `PascalCase` name, used as the `name` field of serialized errors.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::PaymentError => "PaymentError",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::NotAcceptable => "NotAcceptable",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::LengthRequired => "LengthRequired",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::TooManyRequests => "TooManyRequests",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::NotImplemented => "NotImplemented",
            ErrorKind::BadGateway => "BadGateway",
            ErrorKind::Unavailable => "Unavailable",
        }
    }

    /// kebab-case name, used as the `className` field of serialized errors.
    #[must_use]
    pub fn class_name(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotAuthenticated => "not-authenticated",
            ErrorKind::PaymentError => "payment-error",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::MethodNotAllowed => "method-not-allowed",
            ErrorKind::NotAcceptable => "not-acceptable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Conflict => "conflict",
            ErrorKind::LengthRequired => "length-required",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::TooManyRequests => "too-many-requests",
            ErrorKind::GeneralError => "general-error",
            ErrorKind::NotImplemented => "not-implemented",
            ErrorKind::BadGateway => "bad-gateway",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error raised by a service method or a hook.
///
/// # Example
///
/// ```
/// use plume_service::{ErrorKind, ServiceError};
/// use serde_json::json;
///
/// let err = ServiceError::bad_request("text is required")
///     .with_data(json!({ "field": "text" }));
///
/// assert_eq!(err.kind(), ErrorKind::BadRequest);
/// assert_eq!(err.code(), 400);
/// assert_eq!(err.to_json()["className"], json!("bad-request"));
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ServiceError {
    kind: ErrorKind,
    message: String,
    data: Option<Value>,
}

/// Result of a service method.
pub type ServiceResult<T = Value> = Result<T, ServiceError>;

impl ServiceError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a [`BadRequest`](ErrorKind::BadRequest) error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    /// Creates a [`NotAuthenticated`](ErrorKind::NotAuthenticated) error.
    pub fn not_authenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, message)
    }

    /// Creates a [`Forbidden`](ErrorKind::Forbidden) error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Creates a [`NotFound`](ErrorKind::NotFound) error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates a [`MethodNotAllowed`](ErrorKind::MethodNotAllowed) error.
    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, message)
    }

    /// Creates a [`Conflict`](ErrorKind::Conflict) error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Creates an [`Unprocessable`](ErrorKind::Unprocessable) error.
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, message)
    }

    /// Creates a [`Timeout`](ErrorKind::Timeout) error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Creates a [`GeneralError`](ErrorKind::GeneralError).
    pub fn general(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, message)
    }

    /// Creates an [`Unavailable`](ErrorKind::Unavailable) error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    /// Creates the error returned by the default body of an unimplemented method.
    pub fn not_implemented(method: &Method) -> Self {
        Self::new(
            ErrorKind::NotImplemented,
            format!("method '{method}' is not implemented by this service"),
        )
    }

    /// Attaches structured data.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the attached data.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Returns the status code of the error kind.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    /// Returns the kebab-case class name of the error kind.
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Formats the error as a JSON object
    /// `{ name, message, code, className, data? }`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "name": self.kind.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });
        if let (Some(data), Some(object)) = (&self.data, value.as_object_mut()) {
            object.insert("data".to_owned(), data.clone());
        }
        value
    }
}

impl Serialize for ServiceError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.data.is_some() { 5 } else { 4 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("name", self.kind.name())?;
        map.serialize_entry("message", &self.message)?;
        map.serialize_entry("code", &self.code())?;
        map.serialize_entry("className", self.class_name())?;
        if let Some(data) = &self.data {
            map.serialize_entry("data", data)?;
        }
        map.end()
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::bad_request(err.to_string())
    }
}
