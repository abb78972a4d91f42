//! Message model module.
//!
//! A message's content is immutable after send; what moves are the two
//! per-participant overlays: the folder assignment and the soft-delete set.

mod model;

pub use model::{Classification, Folder, Message, MessageId, Role, UserId};
