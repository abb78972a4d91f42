//! Mailbox service: storage, ordering, and notifications around the state
//! machine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use postsift_classify::{Classifier, RemoteSignal, Verdict};

use super::machine::{ActionError, Effect, MailboxAction, apply};
use crate::message::{Classification, Folder, Message, MessageId, UserId};
use crate::notify::{Notification, NotificationEvent, NotificationSink};
use crate::store::MessageStore;
use crate::{Error, Result, ValidationError};

/// Coordinates message creation and folder transitions.
///
/// Each mutation is serialized per message id through a lock registry, so
/// concurrent requests on the same message apply in a well-defined order
/// and the destroy decision is computed from one consistent snapshot.
pub struct MailboxService<S, N> {
    store: S,
    sink: N,
    locks: Mutex<HashMap<MessageId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: MessageStore, N: NotificationSink> MailboxService<S, N> {
    /// Create a service over the given store and notification sink.
    pub fn new(store: S, sink: N) -> Self {
        Self {
            store,
            sink,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying message store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Create a message from a send request and an already-computed verdict.
    ///
    /// The sender's view starts in `sent`; the recipient's initial folder
    /// follows the verdict (`spam` or `inbox`). Emits a `NewMessage` event
    /// to the recipient.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty recipient address or body,
    /// or a database error from the store.
    #[allow(clippy::too_many_arguments)]
    pub async fn send(
        &self,
        sender: UserId,
        recipient: UserId,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
        verdict: &Verdict,
    ) -> Result<Message> {
        if to.trim().is_empty() {
            return Err(ValidationError::EmptyRecipient.into());
        }
        if body.trim().is_empty() {
            return Err(ValidationError::EmptyBody.into());
        }

        let recipient_folder = if verdict.label.is_spam() {
            Folder::Spam
        } else {
            Folder::Inbox
        };
        let message = Message::new(
            sender,
            recipient,
            from,
            to,
            subject,
            body,
            Classification::from_verdict(verdict),
            recipient_folder,
        );
        let message = self.store.create(message).await?;

        if let Some(id) = message.id {
            info!(%sender, %recipient, %id, folder = %recipient_folder, "message sent");
            self.sink.notify(Notification {
                recipient,
                message_id: id,
                event: NotificationEvent::NewMessage,
            });
        }
        Ok(message)
    }

    /// Classify a body and send in one step.
    ///
    /// Classification never fails; see [`MailboxService::send`] for errors.
    ///
    /// # Errors
    ///
    /// Same as [`MailboxService::send`].
    #[allow(clippy::too_many_arguments)]
    pub async fn classify_and_send<R: RemoteSignal>(
        &self,
        classifier: &Classifier<R>,
        sender: UserId,
        recipient: UserId,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<Message> {
        let verdict = classifier.classify(body).await;
        self.send(sender, recipient, from, to, subject, body, &verdict)
            .await
    }

    /// Move the actor's view of a message to trash.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`], [`Error::Unauthorized`],
    /// [`Error::Transition`], or a database error.
    pub async fn move_to_trash(&self, actor: UserId, id: MessageId) -> Result<Effect> {
        self.act(actor, id, MailboxAction::MoveToTrash).await
    }

    /// Report a message as spam.
    ///
    /// # Errors
    ///
    /// Same error cases as [`MailboxService::move_to_trash`].
    pub async fn mark_spam(&self, actor: UserId, id: MessageId) -> Result<Effect> {
        self.act(actor, id, MailboxAction::MarkSpam).await
    }

    /// Report a message as not spam.
    ///
    /// # Errors
    ///
    /// Same error cases as [`MailboxService::move_to_trash`].
    pub async fn mark_not_spam(&self, actor: UserId, id: MessageId) -> Result<Effect> {
        self.act(actor, id, MailboxAction::MarkNotSpam).await
    }

    /// Mark a message as read.
    ///
    /// # Errors
    ///
    /// Same error cases as [`MailboxService::move_to_trash`].
    pub async fn mark_read(&self, actor: UserId, id: MessageId) -> Result<Effect> {
        self.act(actor, id, MailboxAction::MarkRead).await
    }

    /// Remove the actor's view of a message; destroys the message once both
    /// participants have deleted.
    ///
    /// # Errors
    ///
    /// Same error cases as [`MailboxService::move_to_trash`].
    pub async fn delete(&self, actor: UserId, id: MessageId) -> Result<Effect> {
        self.act(actor, id, MailboxAction::Delete).await
    }

    /// Produce a fresh verdict for a stored message body without touching
    /// the stored classification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the message does not exist.
    pub async fn annotate<R: RemoteSignal>(
        &self,
        classifier: &Classifier<R>,
        id: MessageId,
    ) -> Result<Verdict> {
        let message = self.store.find_by_id(id).await?;
        Ok(classifier.classify(&message.body).await)
    }

    /// Apply one action under the message's lock, then release the lock's
    /// registry entry once no other task is waiting on it.
    async fn act(&self, actor: UserId, id: MessageId, action: MailboxAction) -> Result<Effect> {
        let lock = self.lock_for(id);
        let result = {
            let _guard = lock.lock().await;
            self.transition(actor, id, action).await
        };
        drop(lock);
        self.prune_lock(id);
        result
    }

    /// Load, transition, persist, notify. Either every step applies or the
    /// stored message is unchanged. Caller must hold the message's lock.
    async fn transition(
        &self,
        actor: UserId,
        id: MessageId,
        action: MailboxAction,
    ) -> Result<Effect> {
        let mut message = self.store.find_by_id(id).await?;
        let effect = apply(&mut message, actor, action).map_err(|err| match err {
            ActionError::Unauthorized => Error::Unauthorized {
                actor,
                message: id,
            },
            ActionError::Rejected(rejection) => Error::Transition(rejection),
        })?;

        if effect == Effect::Destroyed {
            self.store.delete(id).await?;
        } else {
            self.store.save(&message).await?;
        }

        info!(%actor, %id, %action, ?effect, "mailbox transition applied");
        if let Some(event) = transition_event(action, effect) {
            self.sink.notify(Notification {
                recipient: actor,
                message_id: id,
                event,
            });
        }
        Ok(effect)
    }

    fn lock_for(&self, id: MessageId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id).or_default())
    }

    /// Drop the registry entry unless another task still holds a clone, so
    /// the registry stays bounded by in-flight actions.
    fn prune_lock(&self, id: MessageId) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(&id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&id);
        }
    }
}

/// The event a completed transition emits, if any.
const fn transition_event(action: MailboxAction, effect: Effect) -> Option<NotificationEvent> {
    match (action, effect) {
        (MailboxAction::MoveToTrash, _) => Some(NotificationEvent::MovedToTrash),
        (MailboxAction::MarkRead, _) => Some(NotificationEvent::MarkedRead),
        (MailboxAction::Delete, Effect::Destroyed) => {
            Some(NotificationEvent::Deleted { permanent: true })
        }
        (MailboxAction::Delete, _) => Some(NotificationEvent::Deleted { permanent: false }),
        _ => None,
    }
}
