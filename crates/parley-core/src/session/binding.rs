//! Per-session generation context.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use parley_types::chat::SessionKey;

use crate::llm::prompt::PromptTemplate;
use crate::llm::provider::LlmProvider;
use crate::transcript::handle::TranscriptHandle;
use crate::transcript::store::TranscriptStore;

/// Generation context bound to one `(user_id, session_id)` key.
///
/// Carries the prompt template, a shared handle to the generation provider,
/// a transcript accessor for the key, and the session's turn slot. Turns on
/// the same binding run one at a time: each holds the slot from preparation
/// until its commit completes.
pub struct SessionBinding<S: TranscriptStore> {
    key: SessionKey,
    template: PromptTemplate,
    provider: Arc<dyn LlmProvider>,
    transcript: TranscriptHandle<S>,
    turn_slot: Arc<Mutex<()>>,
}

impl<S: TranscriptStore> SessionBinding<S> {
    pub fn new(
        key: SessionKey,
        template: PromptTemplate,
        provider: Arc<dyn LlmProvider>,
        store: Arc<S>,
    ) -> Self {
        let transcript = TranscriptHandle::new(key.clone(), store);
        Self {
            key,
            template,
            provider,
            transcript,
            turn_slot: Arc::new(Mutex::new(())),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    pub fn transcript(&self) -> &TranscriptHandle<S> {
        &self.transcript
    }

    /// Wait for the session's turn slot.
    ///
    /// The returned guard is owned so it can travel with a prepared turn into
    /// a spawned relay task.
    pub async fn acquire_turn(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.turn_slot).lock_owned().await
    }
}
