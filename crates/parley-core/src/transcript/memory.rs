//! In-memory transcript store.
//!
//! Partitions are `DashMap` entries keyed by user id; each holds that user's
//! conversations in creation order. Nothing survives a restart, so this backs
//! tests and ephemeral local runs only.

use dashmap::DashMap;

use parley_types::chat::{ChatMessage, Conversation, ConversationPage, SessionKey};
use parley_types::error::PersistenceError;

use super::store::TranscriptStore;

/// `DashMap`-backed [`TranscriptStore`].
///
/// Each operation holds the partition's shard guard only for the duration of
/// a synchronous mutation, never across an await point.
#[derive(Debug, Default)]
pub struct MemoryTranscriptStore {
    partitions: DashMap<String, Vec<Conversation>>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations held for a user.
    pub fn partition_len(&self, user_id: &str) -> usize {
        self.partitions
            .get(user_id)
            .map(|p| p.len())
            .unwrap_or(0)
    }
}

impl TranscriptStore for MemoryTranscriptStore {
    async fn append(&self, key: &SessionKey, message: &ChatMessage) -> Result<(), PersistenceError> {
        let mut partition = self.partitions.entry(key.user_id.clone()).or_default();
        match partition
            .iter_mut()
            .find(|c| c.session_id == key.session_id)
        {
            Some(conversation) => conversation.messages.push(message.clone()),
            None => partition.push(Conversation {
                user_id: key.user_id.clone(),
                session_id: key.session_id.clone(),
                messages: vec![message.clone()],
            }),
        }
        Ok(())
    }

    async fn read(&self, key: &SessionKey) -> Result<Vec<ChatMessage>, PersistenceError> {
        let messages = self
            .partitions
            .get(&key.user_id)
            .and_then(|partition| {
                partition
                    .iter()
                    .find(|c| c.session_id == key.session_id)
                    .map(|c| c.messages.clone())
            })
            .unwrap_or_default();
        Ok(messages)
    }

    async fn clear(&self, key: &SessionKey) -> Result<(), PersistenceError> {
        if let Some(mut partition) = self.partitions.get_mut(&key.user_id) {
            partition.retain(|c| c.session_id != key.session_id);
        }
        Ok(())
    }

    async fn list_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<ConversationPage, PersistenceError> {
        let offset = match cursor {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| PersistenceError::Query(format!("invalid cursor: {raw}")))?,
            None => 0,
        };
        let page_size = page_size.max(1) as usize;

        let Some(partition) = self.partitions.get(user_id) else {
            return Ok(ConversationPage::default());
        };

        let conversations: Vec<Conversation> = partition
            .iter()
            .skip(offset)
            .take(page_size)
            .cloned()
            .collect();
        let end = offset + conversations.len();
        let next_cursor = (end < partition.len()).then(|| end.to_string());

        Ok(ConversationPage {
            conversations,
            next_cursor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(user: &str, session: &str) -> SessionKey {
        SessionKey::new(user, session)
    }

    #[tokio::test]
    async fn test_append_creates_then_appends() {
        let store = MemoryTranscriptStore::new();
        let k = key("alice", "s-1");

        store.append(&k, &ChatMessage::human("Hello")).await.unwrap();
        store.append(&k, &ChatMessage::ai("Hi there")).await.unwrap();

        let messages = store.read(&k).await.unwrap();
        assert_eq!(
            messages,
            vec![ChatMessage::human("Hello"), ChatMessage::ai("Hi there")]
        );
        assert_eq!(store.partition_len("alice"), 1);
    }

    #[tokio::test]
    async fn test_repeated_appends_are_not_deduplicated() {
        let store = MemoryTranscriptStore::new();
        let k = key("alice", "s-1");
        store.append(&k, &ChatMessage::human("again")).await.unwrap();
        store.append(&k, &ChatMessage::human("again")).await.unwrap();
        assert_eq!(store.read(&k).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_read_missing_is_empty() {
        let store = MemoryTranscriptStore::new();
        assert!(store.read(&key("nobody", "nothing")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_only_target() {
        let store = MemoryTranscriptStore::new();
        store.append(&key("alice", "s-1"), &ChatMessage::human("one")).await.unwrap();
        store.append(&key("alice", "s-2"), &ChatMessage::human("two")).await.unwrap();

        store.clear(&key("alice", "s-1")).await.unwrap();

        assert!(store.read(&key("alice", "s-1")).await.unwrap().is_empty());
        assert_eq!(store.read(&key("alice", "s-2")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_missing_is_noop() {
        let store = MemoryTranscriptStore::new();
        store.clear(&key("alice", "ghost")).await.unwrap();
        store.clear(&key("alice", "ghost")).await.unwrap();
    }

    #[tokio::test]
    async fn test_partitions_are_isolated() {
        let store = MemoryTranscriptStore::new();
        store.append(&key("alice", "shared"), &ChatMessage::human("a")).await.unwrap();
        store.append(&key("bob", "shared"), &ChatMessage::human("b")).await.unwrap();

        let alice = store.read(&key("alice", "shared")).await.unwrap();
        assert_eq!(alice, vec![ChatMessage::human("a")]);

        let page = store.list_page("bob", None, 10).await.unwrap();
        assert_eq!(page.conversations.len(), 1);
        assert_eq!(page.conversations[0].user_id, "bob");
    }

    #[tokio::test]
    async fn test_list_page_cursor() {
        let store = MemoryTranscriptStore::new();
        for i in 0..3 {
            store
                .append(&key("alice", &format!("s-{i}")), &ChatMessage::human("x"))
                .await
                .unwrap();
        }

        let first = store.list_page("alice", None, 2).await.unwrap();
        assert_eq!(first.conversations.len(), 2);
        let cursor = first.next_cursor.expect("more pages");

        let second = store.list_page("alice", Some(&cursor), 2).await.unwrap();
        assert_eq!(second.conversations.len(), 1);
        assert_eq!(second.conversations[0].session_id, "s-2");
        assert!(second.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_list_page_rejects_foreign_cursor() {
        let store = MemoryTranscriptStore::new();
        let err = store.list_page("alice", Some("not-a-number"), 2).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Query(_)));
    }
}
