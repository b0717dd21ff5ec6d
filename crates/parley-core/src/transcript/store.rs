//! TranscriptStore trait definition and partition scans built on it.
//!
//! The store is partitioned by user id so that per-user listing is a
//! single-partition scan; a conversation's identity is its session id within
//! that partition. Follows the same RPITIT pattern as the other ports.

use futures_util::{Stream, TryStreamExt};

use parley_types::chat::{ChatMessage, Conversation, ConversationPage, SessionKey};
use parley_types::error::PersistenceError;

/// Repository trait for conversation documents.
///
/// Implementations live in parley-infra (e.g., `SqliteTranscriptStore`) and
/// in [`super::memory`]. Uses native async fn in traits (RPITIT).
pub trait TranscriptStore: Send + Sync {
    /// Append a message, creating the conversation document if absent.
    ///
    /// Repeated calls append repeated messages; there is no deduplication.
    fn append(
        &self,
        key: &SessionKey,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), PersistenceError>> + Send;

    /// Messages of a conversation in append order. Empty if it does not exist.
    fn read(
        &self,
        key: &SessionKey,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, PersistenceError>> + Send;

    /// Remove a conversation document. Absent documents are not an error.
    fn clear(
        &self,
        key: &SessionKey,
    ) -> impl std::future::Future<Output = Result<(), PersistenceError>> + Send;

    /// Fetch one page of a user's partition, starting after `cursor`.
    fn list_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        page_size: u32,
    ) -> impl std::future::Future<Output = Result<ConversationPage, PersistenceError>> + Send;
}

/// Lazily scan every conversation in a user's partition.
///
/// Pages are fetched on demand as the stream is polled. Each call starts a
/// fresh scan, so the sequence can be restarted by calling again.
pub fn scan_by_user<'a, S: TranscriptStore>(
    store: &'a S,
    user_id: &'a str,
    page_size: u32,
) -> impl Stream<Item = Result<Conversation, PersistenceError>> + Send + 'a {
    let page_size = page_size.max(1);

    async_stream::try_stream! {
        let mut cursor: Option<String> = None;
        loop {
            let page = store.list_page(user_id, cursor.as_deref(), page_size).await?;
            for conversation in page.conversations {
                yield conversation;
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
    }
}

/// Collect a user's whole partition.
///
/// If any page fails, the documents gathered so far are discarded and the
/// error is returned.
pub async fn list_by_user<S: TranscriptStore>(
    store: &S,
    user_id: &str,
    page_size: u32,
) -> Result<Vec<Conversation>, PersistenceError> {
    scan_by_user(store, user_id, page_size).try_collect().await
}
