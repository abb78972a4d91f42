//! `SQLite`-backed message store.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};

use super::MessageStore;
use crate::message::{Classification, Folder, Message, MessageId, UserId};
use crate::{Error, Result, ValidationError};

/// Message store backed by `SQLite`.
///
/// The folder overlay, soft-delete set, and classification snapshot are
/// stored as JSON text columns beside the immutable message content.
pub struct SqliteMessageStore {
    pool: SqlitePool,
}

impl SqliteMessageStore {
    /// Create a store with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id INTEGER NOT NULL,
                recipient_id INTEGER NOT NULL,
                from_address TEXT NOT NULL,
                to_address TEXT NOT NULL,
                subject TEXT NOT NULL DEFAULT '',
                body TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                classification TEXT NOT NULL,
                folder_by_user TEXT NOT NULL,
                deleted_by TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Indexes for per-participant folder listings
        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_messages_sender
            ON messages(sender_id)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_messages_recipient
            ON messages(recipient_id)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List a participant's view of one folder, newest first.
    ///
    /// Soft-deleted views are naturally excluded: a participant without a
    /// folder entry matches nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_folder(&self, user: UserId, folder: Folder) -> Result<Vec<Message>> {
        let path = format!("$.\"{}\"", user.0);
        let rows = sqlx::query(
            r"
            SELECT id, sender_id, recipient_id, from_address, to_address,
                   subject, body, is_read, classification, folder_by_user,
                   deleted_by, created_at
            FROM messages
            WHERE json_extract(folder_by_user, ?) = ?
            ORDER BY created_at DESC
            ",
        )
        .bind(&path)
        .bind(folder.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_message).collect()
    }
}

impl MessageStore for SqliteMessageStore {
    async fn create(&self, mut message: Message) -> Result<Message> {
        let classification = serde_json::to_string(&message.classification)?;
        let folder_by_user = serde_json::to_string(message.folders())?;
        let deleted_by = serde_json::to_string(message.deleted_by())?;

        let result = sqlx::query(
            r"
            INSERT INTO messages (
                sender_id, recipient_id, from_address, to_address, subject,
                body, is_read, classification, folder_by_user, deleted_by,
                created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(message.sender.0)
        .bind(message.recipient.0)
        .bind(&message.from)
        .bind(&message.to)
        .bind(&message.subject)
        .bind(&message.body)
        .bind(i64::from(message.is_read))
        .bind(&classification)
        .bind(&folder_by_user)
        .bind(&deleted_by)
        .bind(message.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        message.id = Some(MessageId::new(result.last_insert_rowid()));
        Ok(message)
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Message> {
        let row = sqlx::query(
            r"
            SELECT id, sender_id, recipient_id, from_address, to_address,
                   subject, body, is_read, classification, folder_by_user,
                   deleted_by, created_at
            FROM messages
            WHERE id = ?
            ",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map_or(Err(Error::NotFound(id)), |r| row_to_message(&r))
    }

    async fn save(&self, message: &Message) -> Result<()> {
        let id = message.id.ok_or(ValidationError::UnsavedMessage)?;
        let classification = serde_json::to_string(&message.classification)?;
        let folder_by_user = serde_json::to_string(message.folders())?;
        let deleted_by = serde_json::to_string(message.deleted_by())?;

        let result = sqlx::query(
            r"
            UPDATE messages
            SET is_read = ?,
                classification = ?,
                folder_by_user = ?,
                deleted_by = ?
            WHERE id = ?
            ",
        )
        .bind(i64::from(message.is_read))
        .bind(&classification)
        .bind(&folder_by_user)
        .bind(&deleted_by)
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: MessageId) -> Result<()> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }
}

/// Convert a database row to a `Message`.
fn row_to_message(row: &SqliteRow) -> Result<Message> {
    let classification: Classification = serde_json::from_str(row.get("classification"))?;
    let folder_by_user: HashMap<UserId, Folder> =
        serde_json::from_str(row.get("folder_by_user"))?;
    let deleted_by: HashSet<UserId> = serde_json::from_str(row.get("deleted_by"))?;
    let created_at =
        DateTime::parse_from_rfc3339(row.get("created_at"))?.with_timezone(&Utc);

    Ok(Message::from_stored(
        MessageId::new(row.get("id")),
        UserId::new(row.get("sender_id")),
        UserId::new(row.get("recipient_id")),
        row.get("from_address"),
        row.get("to_address"),
        row.get("subject"),
        row.get("body"),
        row.get::<i64, _>("is_read") != 0,
        classification,
        folder_by_user,
        deleted_by,
        created_at,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
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

    #[tokio::test]
    async fn test_create_assigns_id_and_roundtrips() {
        let store = SqliteMessageStore::in_memory().await.unwrap();

        let created = store.create(sample()).await.unwrap();
        let id = created.id.unwrap();

        let loaded = store.find_by_id(id).await.unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.folder_of(UserId::new(1)), Some(Folder::Sent));
        assert_eq!(loaded.folder_of(UserId::new(2)), Some(Folder::Inbox));
    }

    #[tokio::test]
    async fn test_find_unknown_id_is_not_found() {
        let store = SqliteMessageStore::in_memory().await.unwrap();
        let err = store.find_by_id(MessageId::new(42)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(MessageId(42))));
    }

    #[tokio::test]
    async fn test_save_persists_overlays() {
        let store = SqliteMessageStore::in_memory().await.unwrap();
        let mut message = store.create(sample()).await.unwrap();

        message.set_folder(UserId::new(2), Folder::Trash);
        message.remove_view(UserId::new(1));
        message.is_read = true;
        message.classification = Classification::user_reported_spam();
        store.save(&message).await.unwrap();

        let loaded = store.find_by_id(message.id.unwrap()).await.unwrap();
        assert_eq!(loaded.folder_of(UserId::new(2)), Some(Folder::Trash));
        assert_eq!(loaded.folder_of(UserId::new(1)), None);
        assert!(loaded.deleted_by().contains(&UserId::new(1)));
        assert!(loaded.is_read);
        assert!(loaded.classification.user_reported);
    }

    #[tokio::test]
    async fn test_save_unsaved_message_is_validation_error() {
        let store = SqliteMessageStore::in_memory().await.unwrap();
        let err = store.save(&sample()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::UnsavedMessage)
        ));
    }

    #[tokio::test]
    async fn test_list_folder_filters_per_participant_view() {
        let store = SqliteMessageStore::in_memory().await.unwrap();
        let first = store.create(sample()).await.unwrap();
        let mut second = store.create(sample()).await.unwrap();

        // Bob trashes the second message; Alice's view of it stays in sent.
        second.set_folder(UserId::new(2), Folder::Trash);
        store.save(&second).await.unwrap();

        let bob_inbox = store
            .list_folder(UserId::new(2), Folder::Inbox)
            .await
            .unwrap();
        assert_eq!(bob_inbox.len(), 1);
        assert_eq!(bob_inbox[0].id, first.id);

        let bob_trash = store
            .list_folder(UserId::new(2), Folder::Trash)
            .await
            .unwrap();
        assert_eq!(bob_trash.len(), 1);
        assert_eq!(bob_trash[0].id, second.id);

        let alice_sent = store
            .list_folder(UserId::new(1), Folder::Sent)
            .await
            .unwrap();
        assert_eq!(alice_sent.len(), 2);
    }

    #[tokio::test]
    async fn test_list_folder_excludes_soft_deleted_views() {
        let store = SqliteMessageStore::in_memory().await.unwrap();
        let mut message = store.create(sample()).await.unwrap();

        message.remove_view(UserId::new(2));
        store.save(&message).await.unwrap();

        assert!(
            store
                .list_folder(UserId::new(2), Folder::Inbox)
                .await
                .unwrap()
                .is_empty()
        );
        // The sender's view is unaffected by the recipient's removal.
        assert_eq!(
            store
                .list_folder(UserId::new(1), Folder::Sent)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_is_an_error() {
        let store = SqliteMessageStore::in_memory().await.unwrap();
        let message = store.create(sample()).await.unwrap();
        let id = message.id.unwrap();

        sqlx::query("UPDATE messages SET created_at = 'not-a-date' WHERE id = ?")
            .bind(id.0)
            .execute(&store.pool)
            .await
            .unwrap();

        assert!(matches!(
            store.find_by_id(id).await.unwrap_err(),
            Error::Timestamp(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let store = SqliteMessageStore::in_memory().await.unwrap();
        let message = store.create(sample()).await.unwrap();
        let id = message.id.unwrap();

        store.delete(id).await.unwrap();
        assert!(matches!(
            store.find_by_id(id).await.unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(matches!(
            store.delete(id).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }
}
