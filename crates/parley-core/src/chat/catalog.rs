//! Per-user conversation listing.

use std::sync::Arc;

use futures_util::TryStreamExt;

use parley_types::chat::ConversationSummary;
use parley_types::error::PersistenceError;

use crate::transcript::store::{TranscriptStore, scan_by_user};

/// Read path that summarizes every conversation in a user's partition.
///
/// Bypasses the session registry entirely.
pub struct ConversationCatalog<S: TranscriptStore> {
    store: Arc<S>,
    page_size: u32,
}

impl<S: TranscriptStore> ConversationCatalog<S> {
    pub fn new(store: Arc<S>, page_size: u32) -> Self {
        Self { store, page_size }
    }

    /// One summary per conversation, in store scan order.
    ///
    /// A page failure discards the summaries gathered so far.
    pub async fn list_summaries(&self, user_id: &str) -> Result<Vec<ConversationSummary>, PersistenceError> {
        scan_by_user(self.store.as_ref(), user_id, self.page_size)
            .map_ok(|conversation| conversation.summary())
            .try_collect()
            .await
    }
}
