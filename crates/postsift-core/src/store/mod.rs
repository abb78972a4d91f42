//! Message storage contract and its `SQLite` implementation.

mod repository;

use std::future::Future;

use crate::Result;
use crate::message::{Message, MessageId};

pub use repository::SqliteMessageStore;

/// Durable storage keyed by message id.
///
/// `save` and `delete` are assumed atomic with respect to the fields they
/// touch; the service layer provides per-message ordering on top.
pub trait MessageStore {
    /// Persist a new message and return it with its assigned id.
    fn create(&self, message: Message) -> impl Future<Output = Result<Message>> + Send;

    /// Load a message by id.
    ///
    /// A destroyed message is gone: lookups after a permanent delete return
    /// [`crate::Error::NotFound`].
    fn find_by_id(&self, id: MessageId) -> impl Future<Output = Result<Message>> + Send;

    /// Persist the mutable overlays of an existing message.
    fn save(&self, message: &Message) -> impl Future<Output = Result<()>> + Send;

    /// Permanently remove a message.
    fn delete(&self, id: MessageId) -> impl Future<Output = Result<()>> + Send;
}
