//! Mailbox transition notifications.
//!
//! The service emits one event per completed transition, addressed to the
//! affected participant. Delivery is fire-and-forget: the core never waits
//! for acknowledgment, and an absent consumer is a valid state.

use tokio::sync::broadcast;
use tracing::debug;

use crate::message::{MessageId, UserId};

/// What happened to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A message arrived in the participant's mailbox.
    NewMessage,
    /// The participant's view moved to trash.
    MovedToTrash,
    /// The message was marked read.
    MarkedRead,
    /// The participant's view was deleted.
    Deleted {
        /// Whether the message was permanently destroyed.
        permanent: bool,
    },
}

/// A transition event addressed to one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notification {
    /// The participant this event concerns.
    pub recipient: UserId,
    /// The message the event concerns.
    pub message_id: MessageId,
    /// What happened.
    pub event: NotificationEvent,
}

/// A fire-and-forget sink for transition events.
pub trait NotificationSink {
    /// Deliver one event. Must not block and must not fail the caller.
    fn notify(&self, notification: Notification);
}

/// Sink that drops every event. Useful in tests and embedding contexts
/// without a consumer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl NotificationSink for NoopSink {
    fn notify(&self, _notification: Notification) {}
}

/// Sink fanning events out over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<Notification>,
}

impl BroadcastSink {
    /// Create a sink with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(64)
    }
}

impl NotificationSink for BroadcastSink {
    fn notify(&self, notification: Notification) {
        // A send error only means there is no subscriber right now.
        if self.tx.send(notification).is_err() {
            debug!(?notification, "no notification subscribers");
        }
    }
}
