//! Event types and the in-process event bus
//!
//! Events are broadcast via `EventBus` and serialized for SSE transmission to
//! connected browsers. Every event names the users it concerns so the SSE
//! endpoint can forward only what a given user may see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::db::{Medal, Role};

/// SwimCoach event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SwimEvent {
    /// A parent uploaded a new video submission
    SubmissionCreated {
        submission_id: Uuid,
        pupil_id: Uuid,
        coach_id: Uuid,
        level_number: i64,
        timestamp: DateTime<Utc>,
    },

    /// A coach reviewed a submission
    SubmissionReviewed {
        submission_id: Uuid,
        pupil_id: Uuid,
        parent_id: Uuid,
        level_number: i64,
        medal: Medal,
        /// Pupil progress after the review committed
        progress: i64,
        timestamp: DateTime<Utc>,
    },

    /// A chat message was stored
    MessagePosted {
        message_id: Uuid,
        parent_id: Uuid,
        coach_id: Uuid,
        sender: Role,
        content: String,
        timestamp: DateTime<Utc>,
    },

    /// A notification was stored for a user
    NotificationCreated {
        notification_id: Uuid,
        recipient_id: Uuid,
        title: String,
        body: String,
        url: String,
        timestamp: DateTime<Utc>,
    },
}

impl SwimEvent {
    /// Get event type as string for SSE event names
    pub fn event_type(&self) -> &str {
        match self {
            SwimEvent::SubmissionCreated { .. } => "SubmissionCreated",
            SwimEvent::SubmissionReviewed { .. } => "SubmissionReviewed",
            SwimEvent::MessagePosted { .. } => "MessagePosted",
            SwimEvent::NotificationCreated { .. } => "NotificationCreated",
        }
    }

    /// Whether the given user is a party to this event
    pub fn concerns(&self, user_id: Uuid) -> bool {
        match self {
            SwimEvent::SubmissionCreated { coach_id, .. } => *coach_id == user_id,
            SwimEvent::SubmissionReviewed { parent_id, .. } => *parent_id == user_id,
            SwimEvent::MessagePosted {
                parent_id, coach_id, ..
            } => *parent_id == user_id || *coach_id == user_id,
            SwimEvent::NotificationCreated { recipient_id, .. } => *recipient_id == user_id,
        }
    }
}

/// Broadcast bus for `SwimEvent`
///
/// Cloning the bus shares the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SwimEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered before slow subscribers
    /// start losing the oldest ones.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SwimEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: SwimEvent) -> Result<usize, broadcast::error::SendError<SwimEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SwimEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
