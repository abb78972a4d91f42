//! Mailbox state machine and service.
//!
//! [`apply`] is the pure transition layer: given a message, an actor, and an
//! action it either mutates the message's overlays and reports the effect,
//! or rejects the transition leaving the message untouched.
//! [`MailboxService`] wraps it with storage, per-message serialization, and
//! notification events.

mod machine;
mod service;

pub use machine::{ActionError, Effect, MailboxAction, TransitionRejected, apply};
pub use service::MailboxService;
