//! Broadcast publisher for chain lifecycle events.
//!
//! Publishing is best-effort: the engine emits `chain.created`,
//! `chain.state_transition` and `chain.completed` events for any interested
//! in-process subscriber, and an execution never fails because nobody is
//! listening.

use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Publisher for chain lifecycle events.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<LifecycleEvent>,
}

/// A lifecycle event as delivered to subscribers.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    /// Event name, one of [`crate::constants::events`].
    pub name: String,
    /// Chain the event concerns.
    pub chain_id: Uuid,
    /// Event payload (new state, resource pairs, actor).
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new publisher with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a lifecycle event. Having zero subscribers is not an error.
    pub fn publish(&self, name: impl Into<String>, chain_id: Uuid, context: Value) {
        let event = LifecycleEvent {
            name: name.into(),
            chain_id,
            context,
            published_at: chrono::Utc::now(),
        };
        // send() errs only when there are no receivers; publishing is
        // fire-and-forget either way.
        let _ = self.sender.send(event);
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(256)
    }
}
