//! Transcript accessor bound to one session key.

use std::sync::Arc;

use parley_types::chat::{ChatMessage, SessionKey};
use parley_types::error::PersistenceError;

use super::store::TranscriptStore;

/// Reads and appends the messages of a single conversation.
///
/// Holds a shared reference to the store; it does not own the conversation.
/// Dropping or rebuilding a handle loses nothing.
pub struct TranscriptHandle<S: TranscriptStore> {
    key: SessionKey,
    store: Arc<S>,
}

impl<S: TranscriptStore> TranscriptHandle<S> {
    pub fn new(key: SessionKey, store: Arc<S>) -> Self {
        Self { key, store }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Full transcript in append order.
    pub async fn messages(&self) -> Result<Vec<ChatMessage>, PersistenceError> {
        self.store.read(&self.key).await
    }

    pub async fn add_user_message(&self, content: &str) -> Result<(), PersistenceError> {
        self.store.append(&self.key, &ChatMessage::human(content)).await
    }

    pub async fn add_ai_message(&self, content: &str) -> Result<(), PersistenceError> {
        self.store.append(&self.key, &ChatMessage::ai(content)).await
    }

    pub async fn clear(&self) -> Result<(), PersistenceError> {
        self.store.clear(&self.key).await
    }
}

impl<S: TranscriptStore> Clone for TranscriptHandle<S> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            store: Arc::clone(&self.store),
        }
    }
}
