//! Broadcast of service events.
//!
//! After a successful call whose context still names an event, the service
//! wrapper publishes a [`ServiceEvent`] on the application's [`EventBus`].
//! Publishing never waits: slow subscribers lag and drop events instead of
//! blocking dispatch, and a call succeeds whether or not anyone listens.

use std::sync::atomic::{AtomicU64, Ordering};

use plume_service::{Id, Method};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

/// Default broadcast channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// A change published after a successful service call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceEvent {
    /// Path of the service that produced the event.
    pub path: String,
    /// Event name, e.g. `created`.
    pub event: String,
    /// The method that produced the event.
    pub method: Method,
    /// The record id the call targeted, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    /// The final result (or one element of an array result).
    pub data: Value,
}

/// Broadcast channel for [`ServiceEvent`]s.
pub struct EventBus {
    tx: broadcast::Sender<ServiceEvent>,
    emit_count: AtomicU64,
}

impl EventBus {
    /// Creates a bus with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Creates a bus with a custom channel capacity.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            emit_count: AtomicU64::new(0),
        }
    }

    /// Publishes an event. Non-blocking.
    ///
    /// Returns the number of subscribers that received it.
    pub fn emit(&self, event: ServiceEvent) -> usize {
        self.emit_count.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(path = %event.path, event = %event.event, "service event");
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribes to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ServiceEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Returns the total number of events published.
    #[must_use]
    pub fn emit_count(&self) -> u64 {
        self.emit_count.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn created(n: i64) -> ServiceEvent {
        ServiceEvent {
            path: "messages".into(),
            event: "created".into(),
            method: Method::Create,
            id: None,
            data: json!({ "n": n }),
        }
    }

    #[test]
    fn emit_with_no_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.emit(created(1)), 0);
        assert_eq!(bus.emit_count(), 1);
    }

    #[tokio::test]
    async fn subscribers_receive_events() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.emit(created(1)), 2);

        assert_eq!(first.recv().await.unwrap(), created(1));
        assert_eq!(second.recv().await.unwrap(), created(1));
    }

    #[tokio::test]
    async fn slow_subscriber_lags() {
        let bus = EventBus::with_capacity(2);
        let mut rx = bus.subscribe();

        for n in 0..3 {
            bus.emit(created(n));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
    }

    #[test]
    fn serializes_without_missing_id() {
        let value = serde_json::to_value(created(5)).unwrap();
        assert_eq!(
            value,
            json!({ "path": "messages", "event": "created", "method": "create", "data": { "n": 5 } })
        );
    }
}
