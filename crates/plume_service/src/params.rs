//! Call options passed alongside every service method.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller-supplied call options.
///
/// `Params` carries the query, the authenticated principal and transport
/// metadata. Hooks may freely rewrite any field before the service sees it.
/// Keys that have no dedicated field live in `extra`, which is flattened when
/// serialized.
///
/// # Example
///
/// ```
/// use plume_service::Params;
/// use serde_json::json;
///
/// let params = Params::new()
///     .with_query("read", json!(false))
///     .with_provider("rest");
///
/// assert_eq!(params.query.get("read"), Some(&json!(false)));
/// assert!(!params.is_internal());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Query filters for `find` and multi-record operations.
    #[serde(default)]
    pub query: Map<String, Value>,
    /// Transport that originated the call (`"rest"`, `"socket"`, ...).
    /// `None` for calls made from inside the application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Authenticated principal, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    /// Transport headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Any other call option.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Params {
    /// Creates empty params.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query entry.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: Value) -> Self {
        self.query.insert(key.into(), value);
        self
    }

    /// Sets the originating transport.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the authenticated principal.
    #[must_use]
    pub fn with_user(mut self, user: Value) -> Self {
        self.user = Some(user);
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns an extra call option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Sets an extra call option, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.extra.insert(key.into(), value)
    }

    /// Returns true when the call did not come through a transport.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.provider.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extra_keys_round_trip_flattened() {
        let mut params = Params::new().with_provider("socket");
        params.set("tenant", json!("acme"));

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["tenant"], json!("acme"));
        assert_eq!(value["provider"], json!("socket"));
        assert!(value.get("user").is_none());

        let back: Params = serde_json::from_value(value).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn set_returns_previous_value() {
        let mut params = Params::new();
        assert_eq!(params.set("a", json!(1)), None);
        assert_eq!(params.set("a", json!(2)), Some(json!(1)));
        assert_eq!(params.get("a"), Some(&json!(2)));
    }

    #[test]
    fn internal_calls_have_no_provider() {
        assert!(Params::new().is_internal());
        assert!(!Params::new().with_provider("rest").is_internal());
    }
}
