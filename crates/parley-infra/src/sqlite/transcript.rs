//! SQLite transcript store implementation.
//!
//! Implements `TranscriptStore` from `parley-core`. One row per conversation;
//! the message list is a JSON array appended in place with `json_insert`, so
//! an append is a single upsert statement on the writer connection. Follows
//! the usual pattern: raw queries, a private Row struct, split reader/writer
//! pool usage.

use chrono::Utc;
use sqlx::Row;

use parley_core::transcript::store::TranscriptStore;
use parley_types::chat::{ChatMessage, Conversation, ConversationPage, SessionKey};
use parley_types::error::PersistenceError;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `TranscriptStore`.
pub struct SqliteTranscriptStore {
    pool: DatabasePool,
}

impl SqliteTranscriptStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type for mapping SQLite rows to domain Conversation.
struct ConversationRow {
    id: i64,
    user_id: String,
    session_id: String,
    messages: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            session_id: row.try_get("session_id")?,
            messages: row.try_get("messages")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, PersistenceError> {
        Ok(Conversation {
            messages: decode_messages(&self.session_id, &self.messages)?,
            user_id: self.user_id,
            session_id: self.session_id,
        })
    }
}

fn decode_messages(session_id: &str, raw: &str) -> Result<Vec<ChatMessage>, PersistenceError> {
    serde_json::from_str(raw)
        .map_err(|e| PersistenceError::Decode(format!("session {session_id}: {e}")))
}

fn map_sqlx_error(err: sqlx::Error) -> PersistenceError {
    match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            PersistenceError::Unavailable(err.to_string())
        }
        _ => PersistenceError::Query(err.to_string()),
    }
}

// ---------------------------------------------------------------------------
// TranscriptStore implementation
// ---------------------------------------------------------------------------

impl TranscriptStore for SqliteTranscriptStore {
    async fn append(&self, key: &SessionKey, message: &ChatMessage) -> Result<(), PersistenceError> {
        let payload = serde_json::to_string(message)
            .map_err(|e| PersistenceError::Query(format!("encode message: {e}")))?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"INSERT INTO conversations (user_id, session_id, messages, created_at, updated_at)
               VALUES (?1, ?2, json_array(json(?3)), ?4, ?4)
               ON CONFLICT (user_id, session_id) DO UPDATE
               SET messages = json_insert(conversations.messages, '$[#]', json(?3)),
                   updated_at = ?4"#,
        )
        .bind(&key.user_id)
        .bind(&key.session_id)
        .bind(payload)
        .bind(now)
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn read(&self, key: &SessionKey) -> Result<Vec<ChatMessage>, PersistenceError> {
        let row = sqlx::query("SELECT messages FROM conversations WHERE user_id = ? AND session_id = ?")
            .bind(&key.user_id)
            .bind(&key.session_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("messages").map_err(map_sqlx_error)?;
                decode_messages(&key.session_id, &raw)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn clear(&self, key: &SessionKey) -> Result<(), PersistenceError> {
        sqlx::query("DELETE FROM conversations WHERE user_id = ? AND session_id = ?")
            .bind(&key.user_id)
            .bind(&key.session_id)
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn list_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<ConversationPage, PersistenceError> {
        let after: i64 = match cursor {
            Some(raw) => raw
                .parse()
                .map_err(|_| PersistenceError::Query(format!("invalid cursor: {raw}")))?,
            None => 0,
        };
        let limit = i64::from(page_size.max(1));

        // One extra row tells us whether another page exists
        let rows = sqlx::query(
            r#"SELECT id, user_id, session_id, messages FROM conversations
               WHERE user_id = ? AND id > ?
               ORDER BY id
               LIMIT ?"#,
        )
        .bind(user_id)
        .bind(after)
        .bind(limit + 1)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        let has_more = rows.len() as i64 > limit;
        let mut conversations = Vec::with_capacity(rows.len().min(limit as usize));
        let mut last_id = after;
        for row in rows.iter().take(limit as usize) {
            let conversation_row = ConversationRow::from_row(row).map_err(map_sqlx_error)?;
            last_id = conversation_row.id;
            conversations.push(conversation_row.into_conversation()?);
        }

        Ok(ConversationPage {
            conversations,
            next_cursor: has_more.then(|| last_id.to_string()),
        })
    }
}
