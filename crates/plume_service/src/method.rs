//! Service method identifiers.
//!
//! Every call into a service names one [`Method`]. The six standard CRUD verbs
//! have dedicated variants; anything else is a [`Method::Custom`] method that a
//! service must explicitly declare in [`Service::methods`](crate::Service::methods).

use core::fmt;

use serde::{Deserialize, Serialize};

/// A service method: one of the CRUD verbs or a named custom method.
///
/// Parsing a string never fails. Standard names map to their variant and any
/// other name becomes [`Method::Custom`]:
///
/// ```
/// use plume_service::Method;
///
/// assert_eq!(Method::from("create"), Method::Create);
/// assert_eq!(Method::from("archive"), Method::Custom("archive".into()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Method {
    /// List records matching `params.query`.
    Find,
    /// Fetch one record by id.
    Get,
    /// Create one or more records from `data`.
    Create,
    /// Replace a record.
    Update,
    /// Merge `data` into one or more records.
    Patch,
    /// Remove one or more records.
    Remove,
    /// A service-specific method called with `data` and `params`.
    Custom(String),
}

impl Method {
    /// The six standard CRUD methods in canonical order.
    pub const STANDARD: [Method; 6] = [
        Method::Find,
        Method::Get,
        Method::Create,
        Method::Update,
        Method::Patch,
        Method::Remove,
    ];

    /// Creates a method from a name, normalizing standard names.
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::from(name.into())
    }

    /// Returns the method name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Method::Find => "find",
            Method::Get => "get",
            Method::Create => "create",
            Method::Update => "update",
            Method::Patch => "patch",
            Method::Remove => "remove",
            Method::Custom(name) => name,
        }
    }

    /// Returns true for the six CRUD verbs.
    #[must_use]
    pub fn is_standard(&self) -> bool {
        !matches!(self, Method::Custom(_))
    }

    /// Returns true for methods that change service state.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Method::Create | Method::Update | Method::Patch | Method::Remove
        )
    }

    /// Returns true if the method addresses a record by id.
    #[must_use]
    pub fn takes_id(&self) -> bool {
        matches!(
            self,
            Method::Get | Method::Update | Method::Patch | Method::Remove
        )
    }

    /// Returns true if the method carries a request payload.
    #[must_use]
    pub fn takes_data(&self) -> bool {
        matches!(
            self,
            Method::Create | Method::Update | Method::Patch | Method::Custom(_)
        )
    }

    /// Name of the lifecycle event published after a successful call.
    ///
    /// Only mutating CRUD methods publish events.
    #[must_use]
    pub fn event_name(&self) -> Option<&'static str> {
        match self {
            Method::Create => Some("created"),
            Method::Update => Some("updated"),
            Method::Patch => Some("patched"),
            Method::Remove => Some("removed"),
            Method::Find | Method::Get | Method::Custom(_) => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Method {
    fn from(name: &str) -> Self {
        match name {
            "find" => Method::Find,
            "get" => Method::Get,
            "create" => Method::Create,
            "update" => Method::Update,
            "patch" => Method::Patch,
            "remove" => Method::Remove,
            other => Method::Custom(other.to_owned()),
        }
    }
}

impl From<String> for Method {
    fn from(name: String) -> Self {
        match Method::from(name.as_str()) {
            Method::Custom(_) => Method::Custom(name),
            standard => standard,
        }
    }
}

impl From<&String> for Method {
    fn from(name: &String) -> Self {
        Method::from(name.as_str())
    }
}

impl From<&Method> for Method {
    fn from(method: &Method) -> Self {
        method.clone()
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        match method {
            Method::Custom(name) => name,
            standard => standard.as_str().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_names_parse_to_variants() {
        for method in Method::STANDARD {
            assert_eq!(Method::from(method.as_str()), method);
        }
    }

    #[test]
    fn unknown_names_become_custom() {
        let method = Method::custom("archive");
        assert_eq!(method, Method::Custom("archive".to_string()));
        assert!(!method.is_standard());
        assert_eq!(method.to_string(), "archive");
    }

    #[test]
    fn custom_constructor_normalizes_standard_names() {
        assert_eq!(Method::custom("patch"), Method::Patch);
    }

    #[test]
    fn only_mutating_methods_have_events() {
        assert_eq!(Method::Create.event_name(), Some("created"));
        assert_eq!(Method::Update.event_name(), Some("updated"));
        assert_eq!(Method::Patch.event_name(), Some("patched"));
        assert_eq!(Method::Remove.event_name(), Some("removed"));
        assert_eq!(Method::Find.event_name(), None);
        assert_eq!(Method::Get.event_name(), None);
        assert_eq!(Method::custom("archive").event_name(), None);
    }

    #[test]
    fn argument_shapes() {
        assert!(!Method::Find.takes_id());
        assert!(!Method::Find.takes_data());
        assert!(Method::Get.takes_id());
        assert!(!Method::Get.takes_data());
        assert!(Method::Patch.takes_id());
        assert!(Method::Patch.takes_data());
        assert!(!Method::Create.takes_id());
        assert!(Method::custom("archive").takes_data());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Method::custom("archive")).unwrap();
        assert_eq!(json, "\"archive\"");

        let parsed: Method = serde_json::from_str("\"remove\"").unwrap();
        assert_eq!(parsed, Method::Remove);
    }
}
