//! In-memory message store.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use plume_service::{Id, Method, Params, Service, ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A stored message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Record id, assigned on creation.
    pub id: i64,
    /// Message body.
    pub text: String,
    /// Author, if known.
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
struct NewMessage {
    text: String,
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct MessagePatch {
    text: Option<String>,
}

/// Keeps messages in insertion order.
///
/// Supports `find`, `get`, `create`, `patch`, `remove` and the custom `clear`
/// method. `find` honours the `userId` and `$limit` query keys.
#[derive(Default)]
pub struct MessageService {
    messages: Mutex<IndexMap<i64, Message>>,
    next_id: AtomicI64,
}

impl MessageService {
    /// Name of the custom method that removes every message.
    pub const CLEAR: &'static str = "clear";

    /// Number of stored messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    /// Returns true if no message is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    fn key(id: Option<&Id>, method: &str) -> Result<i64, ServiceError> {
        match id {
            Some(Id::Number(n)) => Ok(*n),
            Some(Id::Text(text)) => text
                .parse()
                .map_err(|_| ServiceError::not_found(format!("no message with id '{text}'"))),
            None => Err(ServiceError::bad_request(format!("'{method}' requires an id"))),
        }
    }

    fn not_found(id: i64) -> ServiceError {
        ServiceError::not_found(format!("no message with id {id}"))
    }

    fn parse<T: for<'de> Deserialize<'de>>(data: Value) -> Result<T, ServiceError> {
        serde_json::from_value(data).map_err(|err| ServiceError::bad_request(err.to_string()))
    }

    fn encode<T: Serialize>(value: &T) -> ServiceResult {
        serde_json::to_value(value).map_err(|err| ServiceError::general(err.to_string()))
    }

    fn insert(&self, new: NewMessage) -> Message {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let message = Message {
            id,
            text: new.text,
            user_id: new.user_id,
        };
        self.messages.lock().insert(id, message.clone());
        message
    }
}

#[async_trait]
impl Service for MessageService {
    fn methods(&self) -> Vec<Method> {
        vec![
            Method::Find,
            Method::Get,
            Method::Create,
            Method::Patch,
            Method::Remove,
            Method::custom(Self::CLEAR),
        ]
    }

    async fn find(&self, params: &Params) -> ServiceResult {
        let author = params.query.get("userId").and_then(Value::as_str);
        let limit = params
            .query
            .get("$limit")
            .and_then(Value::as_u64)
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));

        let found: Vec<Message> = self
            .messages
            .lock()
            .values()
            .filter(|m| author.is_none_or(|a| m.user_id.as_deref() == Some(a)))
            .take(limit)
            .cloned()
            .collect();
        Self::encode(&found)
    }

    async fn get(&self, id: &Id, _params: &Params) -> ServiceResult {
        let key = Self::key(Some(id), "get")?;
        let message = self
            .messages
            .lock()
            .get(&key)
            .cloned()
            .ok_or_else(|| Self::not_found(key))?;
        Self::encode(&message)
    }

    async fn create(&self, data: Value, _params: &Params) -> ServiceResult {
        if data.is_array() {
            let batch: Vec<NewMessage> = Self::parse(data)?;
            let created: Vec<Message> = batch.into_iter().map(|new| self.insert(new)).collect();
            return Self::encode(&created);
        }
        let created = self.insert(Self::parse(data)?);
        Self::encode(&created)
    }

    async fn patch(&self, id: Option<&Id>, data: Value, _params: &Params) -> ServiceResult {
        let key = Self::key(id, "patch")?;
        let changes: MessagePatch = Self::parse(data)?;

        let mut messages = self.messages.lock();
        let message = messages.get_mut(&key).ok_or_else(|| Self::not_found(key))?;
        if let Some(text) = changes.text {
            message.text = text;
        }
        Self::encode(&*message)
    }

    async fn remove(&self, id: Option<&Id>, _params: &Params) -> ServiceResult {
        let key = Self::key(id, "remove")?;
        let removed = self
            .messages
            .lock()
            .shift_remove(&key)
            .ok_or_else(|| Self::not_found(key))?;
        Self::encode(&removed)
    }

    async fn call_custom(&self, name: &str, _data: Value, _params: &Params) -> ServiceResult {
        if name != Self::CLEAR {
            return Err(ServiceError::not_implemented(&Method::custom(name)));
        }
        let mut messages = self.messages.lock();
        let removed = messages.len();
        messages.clear();
        Ok(json!({ "removed": removed }))
    }

    async fn teardown(&self, path: &str) -> Result<(), ServiceError> {
        tracing::info!(path, remaining = self.len(), "message store closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let service = MessageService::default();
        let first = service
            .create(json!({ "text": "a" }), &Params::new())
            .await
            .unwrap();
        let batch = service
            .create(json!([{ "text": "b" }, { "text": "c" }]), &Params::new())
            .await
            .unwrap();

        assert_eq!(first, json!({ "id": 1, "text": "a" }));
        assert_eq!(batch[0]["id"], json!(2));
        assert_eq!(batch[1]["id"], json!(3));
        assert_eq!(service.len(), 3);
    }

    #[tokio::test]
    async fn malformed_data_is_a_bad_request() {
        let service = MessageService::default();
        let err = service
            .create(json!({ "body": "no text" }), &Params::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), 400);
    }

    #[tokio::test]
    async fn find_filters_by_author_and_limit() {
        let service = MessageService::default();
        let batch = json!([
            { "text": "a", "userId": "ada" },
            { "text": "b", "userId": "bob" },
            { "text": "c", "userId": "ada" },
        ]);
        service.create(batch, &Params::new()).await.unwrap();

        let by_ada = service
            .find(&Params::new().with_query("userId", json!("ada")))
            .await
            .unwrap();
        assert_eq!(by_ada.as_array().map(Vec::len), Some(2));

        let limited = service
            .find(&Params::new().with_query("$limit", json!(1)))
            .await
            .unwrap();
        assert_eq!(limited, json!([{ "id": 1, "text": "a", "userId": "ada" }]));
    }

    #[tokio::test]
    async fn patch_and_remove_require_existing_ids() {
        let service = MessageService::default();
        service
            .create(json!({ "text": "draft" }), &Params::new())
            .await
            .unwrap();

        let id = Id::from(1);
        let patched = service
            .patch(Some(&id), json!({ "text": "final" }), &Params::new())
            .await
            .unwrap();
        assert_eq!(patched["text"], json!("final"));

        let missing = service.remove(Some(&Id::from(9)), &Params::new()).await;
        assert_eq!(missing.unwrap_err().code(), 404);

        let no_id = service.remove(None, &Params::new()).await;
        assert_eq!(no_id.unwrap_err().code(), 400);

        service.remove(Some(&id), &Params::new()).await.unwrap();
        assert!(service.is_empty());
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let service = MessageService::default();
        service
            .create(json!([{ "text": "a" }, { "text": "b" }]), &Params::new())
            .await
            .unwrap();

        let outcome = service
            .call_custom(MessageService::CLEAR, Value::Null, &Params::new())
            .await
            .unwrap();
        assert_eq!(outcome, json!({ "removed": 2 }));
        assert!(service.is_empty());
    }
}
