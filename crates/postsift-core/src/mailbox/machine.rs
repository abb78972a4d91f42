//! Pure folder transition rules.

use crate::message::{Classification, Folder, Message, Role, UserId};

/// A user-requested mailbox action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxAction {
    /// Move the message to trash.
    MoveToTrash,
    /// Report the message as spam.
    MarkSpam,
    /// Report the message as not spam.
    MarkNotSpam,
    /// Mark the message as read.
    MarkRead,
    /// Remove the caller's view of the message.
    Delete,
}

impl MailboxAction {
    /// Stable action name, used in rejections and logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MoveToTrash => "move-to-trash",
            Self::MarkSpam => "mark-spam",
            Self::MarkNotSpam => "mark-not-spam",
            Self::MarkRead => "mark-read",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for MailboxAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rejected folder transition.
///
/// Carries the actor's current state and the set of states the action is
/// legal from, so an API layer can explain the rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRejected {
    /// The rejected action.
    pub action: MailboxAction,
    /// The actor's role on the message.
    pub role: Role,
    /// The actor's current folder, `None` if they hold no view.
    pub current: Option<Folder>,
    /// Folders the action is legal from, for the required role.
    pub allowed_from: &'static [Folder],
}

impl std::fmt::Display for TransitionRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} rejected: current state ", self.action)?;
        match self.current {
            Some(folder) => write!(f, "{folder}")?,
            None => write!(f, "absent")?,
        }
        write!(f, ", allowed from [")?;
        for (i, folder) in self.allowed_from.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{folder}")?;
        }
        write!(f, "]")
    }
}

impl std::error::Error for TransitionRejected {}

/// What an applied action did to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The actor's folder assignment changed.
    FolderChanged {
        /// Folder before the transition.
        from: Folder,
        /// Folder after the transition.
        to: Folder,
    },
    /// The read flag was set; the folder is unchanged.
    MarkedRead,
    /// The actor's view was removed; the other participant still holds one.
    SoftDeleted,
    /// Both participants have now deleted: the message must be purged.
    Destroyed,
}

/// Why an action could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    /// The actor is neither sender nor recipient.
    Unauthorized,
    /// The transition is illegal for the actor's current state or role.
    Rejected(TransitionRejected),
}

/// Folders a recipient may trash from. Recipient-only, and never from
/// `trash` itself: re-trashing a trashed view is a no-op request.
const TRASH_FROM: &[Folder] = &[Folder::Inbox, Folder::Spam];
const MARK_SPAM_FROM: &[Folder] = &[Folder::Inbox];
const MARK_NOT_SPAM_FROM: &[Folder] = &[Folder::Spam];
const ANY_HELD: &[Folder] = &[Folder::Inbox, Folder::Sent, Folder::Spam, Folder::Trash];

/// Apply a mailbox action for an actor.
///
/// Validates the actor's role and current state against the transition
/// table, then mutates the message. All checks happen before any mutation:
/// an action either fully applies or leaves the message untouched.
///
/// # Errors
///
/// [`ActionError::Unauthorized`] if the actor is not a participant;
/// [`ActionError::Rejected`] if the transition is illegal for the actor's
/// current state or role.
pub fn apply(
    message: &mut Message,
    actor: UserId,
    action: MailboxAction,
) -> Result<Effect, ActionError> {
    let role = message.role_of(actor).ok_or(ActionError::Unauthorized)?;
    let current = message.folder_of(actor);

    let reject = |allowed_from| {
        ActionError::Rejected(TransitionRejected {
            action,
            role,
            current,
            allowed_from,
        })
    };

    match action {
        MailboxAction::MoveToTrash => {
            let from = held_folder(role, Role::Recipient, current, TRASH_FROM)
                .ok_or_else(|| reject(TRASH_FROM))?;
            message.set_folder(actor, Folder::Trash);
            Ok(Effect::FolderChanged {
                from,
                to: Folder::Trash,
            })
        }
        MailboxAction::MarkSpam => {
            let from = held_folder(role, Role::Recipient, current, MARK_SPAM_FROM)
                .ok_or_else(|| reject(MARK_SPAM_FROM))?;
            message.set_folder(actor, Folder::Spam);
            message.classification = Classification::user_reported_spam();
            Ok(Effect::FolderChanged {
                from,
                to: Folder::Spam,
            })
        }
        MailboxAction::MarkNotSpam => {
            let from = held_folder(role, Role::Recipient, current, MARK_NOT_SPAM_FROM)
                .ok_or_else(|| reject(MARK_NOT_SPAM_FROM))?;
            message.set_folder(actor, Folder::Inbox);
            message.classification = Classification::user_reported_ham();
            Ok(Effect::FolderChanged {
                from,
                to: Folder::Inbox,
            })
        }
        MailboxAction::MarkRead => {
            held_folder(role, Role::Recipient, current, ANY_HELD)
                .ok_or_else(|| reject(ANY_HELD))?;
            message.is_read = true;
            Ok(Effect::MarkedRead)
        }
        MailboxAction::Delete => {
            // Either participant may delete, from any state they hold.
            current.ok_or_else(|| reject(ANY_HELD))?;
            message.remove_view(actor);
            if message.is_destroyed() {
                Ok(Effect::Destroyed)
            } else {
                Ok(Effect::SoftDeleted)
            }
        }
    }
}

/// The actor's current folder, when their role matches and the folder is in
/// the allowed-from set.
fn held_folder(
    role: Role,
    required: Role,
    current: Option<Folder>,
    allowed_from: &[Folder],
) -> Option<Folder> {
    if role != required {
        return None;
    }
    current.filter(|folder| allowed_from.contains(folder))
}
