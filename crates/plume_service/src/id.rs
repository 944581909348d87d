//! Record identifiers.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a single record, numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric identifier.
    Number(i64),
    /// String identifier (UUIDs, slugs, ...).
    Text(String),
}

impl Id {
    /// Converts the id into a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Id::Number(n) => Value::from(*n),
            Id::Text(s) => Value::from(s.as_str()),
        }
    }

    /// Reads an id from a JSON value. Only integers and strings qualify.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Id::Number),
            Value::String(s) => Some(Id::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{n}"),
            Id::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Number(value)
    }
}

impl From<i32> for Id {
    fn from(value: i32) -> Self {
        Id::Number(i64::from(value))
    }
}

impl From<u32> for Id {
    fn from(value: u32) -> Self {
        Id::Number(i64::from(value))
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::Text(value.to_owned())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::Text(value)
    }
}

impl From<&Id> for Id {
    fn from(value: &Id) -> Self {
        value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display() {
        assert_eq!(Id::from(7).to_string(), "7");
        assert_eq!(Id::from("abc").to_string(), "abc");
    }

    #[test]
    fn value_conversion() {
        assert_eq!(Id::from_value(&json!(3)), Some(Id::Number(3)));
        assert_eq!(Id::from_value(&json!("x")), Some(Id::Text("x".into())));
        assert_eq!(Id::from_value(&json!(1.5)), None);
        assert_eq!(Id::from_value(&json!(null)), None);
        assert_eq!(Id::Number(4).to_value(), json!(4));
    }

    #[test]
    fn deserializes_untagged() {
        let ids: Vec<Id> = serde_json::from_str(r#"[1, "two"]"#).unwrap();
        assert_eq!(ids, vec![Id::Number(1), Id::Text("two".into())]);
    }
}
