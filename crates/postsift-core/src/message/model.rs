//! Message model types.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use postsift_classify::{Label, Verdict};

/// Unique identifier for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    /// Create a new user ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl MessageId {
    /// Create a new message ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participant-local view state for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Folder {
    /// Received messages.
    Inbox,
    /// Messages the participant sent.
    Sent,
    /// Messages classified or reported as spam.
    Spam,
    /// Soft-removed messages still recoverable by the participant.
    Trash,
}

impl Folder {
    /// Parse from the stored string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "sent" => Self::Sent,
            "spam" => Self::Spam,
            "trash" => Self::Trash,
            _ => Self::Inbox,
        }
    }

    /// Convert to the stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Sent => "sent",
            Self::Spam => "spam",
            Self::Trash => "trash",
        }
    }
}

impl std::fmt::Display for Folder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A participant's relationship to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The participant sent the message.
    Sender,
    /// The participant received the message.
    Recipient,
}

/// Classification snapshot stored on a message.
///
/// Set once at send time from the verdict; mutable afterwards only by
/// explicit user spam/not-spam actions, which set `user_reported`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Spam, ham, or a legacy suspicious value.
    pub label: Label,
    /// Confidence in `[0, 1]`.
    pub score: f64,
    /// Description of how the label was produced.
    pub source: String,
    /// Whether an override signature forced the label.
    pub overridden: bool,
    /// Whether a user report set this label. A user report takes
    /// precedence over automated rescoring.
    pub user_reported: bool,
}

impl Classification {
    /// Snapshot a classification verdict at send time.
    #[must_use]
    pub fn from_verdict(verdict: &Verdict) -> Self {
        Self {
            label: verdict.label,
            score: verdict.confidence,
            source: verdict.source(),
            overridden: verdict.overridden,
            user_reported: false,
        }
    }

    /// Classification after the recipient reports the message as spam.
    #[must_use]
    pub fn user_reported_spam() -> Self {
        Self {
            label: Label::Spam,
            score: 1.0,
            source: "user-report".to_owned(),
            overridden: false,
            user_reported: true,
        }
    }

    /// Classification after the recipient reports the message as not spam.
    #[must_use]
    pub fn user_reported_ham() -> Self {
        Self {
            label: Label::Ham,
            score: 0.0,
            source: "user-report".to_owned(),
            overridden: false,
            user_reported: true,
        }
    }
}

/// A message with per-participant lifecycle state.
///
/// The folder overlay and the soft-delete set are mutually exclusive per
/// participant at all times: the only mutators are [`Message::set_folder`]
/// and [`Message::remove_view`], each of which maintains both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Unique identifier (None for unsaved messages).
    pub id: Option<MessageId>,
    /// Sending participant.
    pub sender: UserId,
    /// Receiving participant.
    pub recipient: UserId,
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Message subject.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Whether the recipient has read the message.
    pub is_read: bool,
    /// Classification snapshot taken at send time.
    pub classification: Classification,
    /// Folder assignment per participant who still retains a view.
    folder_by_user: HashMap<UserId, Folder>,
    /// Participants who removed their view.
    deleted_by: HashSet<UserId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message at send time.
    ///
    /// The sender's view starts in `sent`; the recipient's initial folder is
    /// decided by the classification verdict (`spam` or `inbox`).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sender: UserId,
        recipient: UserId,
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        classification: Classification,
        recipient_folder: Folder,
    ) -> Self {
        let folder_by_user =
            HashMap::from([(sender, Folder::Sent), (recipient, recipient_folder)]);
        Self {
            id: None,
            sender,
            recipient,
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            is_read: false,
            classification,
            folder_by_user,
            deleted_by: HashSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Rebuild a message from stored state.
    ///
    /// Used by store implementations; the overlays are taken as-is.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn from_stored(
        id: MessageId,
        sender: UserId,
        recipient: UserId,
        from: String,
        to: String,
        subject: String,
        body: String,
        is_read: bool,
        classification: Classification,
        folder_by_user: HashMap<UserId, Folder>,
        deleted_by: HashSet<UserId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id),
            sender,
            recipient,
            from,
            to,
            subject,
            body,
            is_read,
            classification,
            folder_by_user,
            deleted_by,
            created_at,
        }
    }

    /// The participant's current folder, or `None` if they removed their view.
    #[must_use]
    pub fn folder_of(&self, user: UserId) -> Option<Folder> {
        self.folder_by_user.get(&user).copied()
    }

    /// The folder overlay for all participants who retain a view.
    #[must_use]
    pub const fn folders(&self) -> &HashMap<UserId, Folder> {
        &self.folder_by_user
    }

    /// Participants who removed their view.
    #[must_use]
    pub const fn deleted_by(&self) -> &HashSet<UserId> {
        &self.deleted_by
    }

    /// The participant's role, or `None` for non-participants.
    #[must_use]
    pub fn role_of(&self, user: UserId) -> Option<Role> {
        if user == self.sender {
            Some(Role::Sender)
        } else if user == self.recipient {
            Some(Role::Recipient)
        } else {
            None
        }
    }

    /// Assign the participant's folder, restoring their view if they had
    /// removed it.
    pub fn set_folder(&mut self, user: UserId, folder: Folder) {
        self.folder_by_user.insert(user, folder);
        self.deleted_by.remove(&user);
    }

    /// Remove the participant's view (soft delete).
    pub fn remove_view(&mut self, user: UserId) {
        self.folder_by_user.remove(&user);
        self.deleted_by.insert(user);
    }

    /// Whether both participants have removed their view.
    ///
    /// A destroyed message has no further lifecycle and must be purged from
    /// the store.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.deleted_by.contains(&self.sender) && self.deleted_by.contains(&self.recipient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Message {
        Message::new(
            UserId::new(1),
            UserId::new(2),
            "alice@example.com",
            "bob@example.com",
            "hello",
            "see you at lunch",
            Classification::user_reported_ham(),
            Folder::Inbox,
        )
    }

    #[test]
    fn test_folder_roundtrip() {
        for folder in [Folder::Inbox, Folder::Sent, Folder::Spam, Folder::Trash] {
            assert_eq!(Folder::parse(folder.as_str()), folder);
        }
    }

    #[test]
    fn test_unknown_folder_string_defaults_to_inbox() {
        assert_eq!(Folder::parse("archive"), Folder::Inbox);
    }

    #[test]
    fn test_new_message_initial_placement() {
        let message = sample();
        assert_eq!(message.folder_of(UserId::new(1)), Some(Folder::Sent));
        assert_eq!(message.folder_of(UserId::new(2)), Some(Folder::Inbox));
        assert!(message.deleted_by().is_empty());
        assert!(!message.is_read);
    }

    #[test]
    fn test_role_of() {
        let message = sample();
        assert_eq!(message.role_of(UserId::new(1)), Some(Role::Sender));
        assert_eq!(message.role_of(UserId::new(2)), Some(Role::Recipient));
        assert_eq!(message.role_of(UserId::new(3)), None);
    }

    #[test]
    fn test_remove_view_maintains_exclusivity() {
        let mut message = sample();
        let bob = UserId::new(2);

        message.remove_view(bob);
        assert_eq!(message.folder_of(bob), None);
        assert!(message.deleted_by().contains(&bob));

        // Restoring a folder clears the deletion marker again.
        message.set_folder(bob, Folder::Inbox);
        assert_eq!(message.folder_of(bob), Some(Folder::Inbox));
        assert!(!message.deleted_by().contains(&bob));
    }

    #[test]
    fn test_destroyed_only_when_both_deleted() {
        let mut message = sample();
        assert!(!message.is_destroyed());

        message.remove_view(UserId::new(1));
        assert!(!message.is_destroyed());

        message.remove_view(UserId::new(2));
        assert!(message.is_destroyed());
    }

    #[test]
    fn test_classification_snapshots() {
        let spam = Classification::user_reported_spam();
        assert_eq!(spam.label, Label::Spam);
        assert!(spam.user_reported);
        assert!((spam.score - 1.0).abs() < f64::EPSILON);

        let ham = Classification::user_reported_ham();
        assert_eq!(ham.label, Label::Ham);
        assert!(ham.user_reported);
    }
}
