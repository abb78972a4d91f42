//! # postsift-core
//!
//! Mailbox core for `PostSift`.
//!
//! This crate provides:
//! - The message model: immutable content plus per-participant folder
//!   overlays and soft-delete tracking
//! - The mailbox state machine governing folder transitions
//! - A `MailboxService` that serializes per-message mutations and emits
//!   transition notifications
//! - The `MessageStore` contract and its `SQLite` implementation
//!
//! Classification itself lives in `postsift-classify`; this crate consumes
//! its verdicts to place messages and records a snapshot on each message.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod mailbox;
pub mod message;
pub mod notify;
pub mod store;

pub use error::{Error, Result, ValidationError};
pub use mailbox::{ActionError, Effect, MailboxAction, MailboxService, TransitionRejected, apply};
pub use message::{Classification, Folder, Message, MessageId, Role, UserId};
pub use notify::{BroadcastSink, NoopSink, Notification, NotificationEvent, NotificationSink};
pub use store::{MessageStore, SqliteMessageStore};
