//! Domain event system: decoupled observation of the tutoring pipeline.
//!
//! The orchestrator publishes an event when a turn completes or when a stage
//! falls back to a degraded value. Front ends may subscribe; nobody has to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A turn ran through every stage and was appended to its session
    TurnCompleted {
        session_id: String,
        interaction_type: String,
        level: u8,
        topic: String,
        trend: String,
        timestamp: DateTime<Utc>,
    },

    /// A stage substituted a fallback value for a failed external call
    StageDegraded {
        session_id: String,
        stage: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// A session's progress and history were cleared
    SessionReset {
        session_id: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
