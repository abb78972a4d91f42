//! Error types for the core library.

use thiserror::Error;

use crate::mailbox::TransitionRejected;
use crate::message::{MessageId, UserId};

/// Validation error for a mailbox request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Recipient address is empty.
    EmptyRecipient,
    /// Message body is empty.
    EmptyBody,
    /// The message has not been persisted yet.
    UnsavedMessage,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyRecipient => "Recipient is required",
            Self::EmptyBody => "Message body is required",
            Self::UnsavedMessage => "Message has no id",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyRecipient => "to",
            Self::EmptyBody => "body",
            Self::UnsavedMessage => "id",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Stored timestamp could not be parsed.
    #[error("Timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    /// Malformed request input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Message unknown to the store (or already destroyed).
    #[error("Message not found: {0}")]
    NotFound(MessageId),

    /// Actor is neither sender nor recipient of the message.
    #[error("User {actor} is not a participant of message {message}")]
    Unauthorized {
        /// The requesting user.
        actor: UserId,
        /// The message they tried to act on.
        message: MessageId,
    },

    /// Requested folder transition is illegal for the current state.
    #[error("{0}")]
    Transition(#[from] TransitionRejected),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
