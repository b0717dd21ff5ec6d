//! Chat service.
//!
//! The façade the transport layer talks to. Owns the session registry (there
//! is no process-wide state) and wires the coordinator and catalog to a single
//! store and provider.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use parley_types::chat::{ChatMessage, ConversationSummary, SessionKey};
use parley_types::error::ChatError;

use super::catalog::ConversationCatalog;
use super::coordinator::{GenerationOptions, PreparedTurn, TurnCoordinator, TurnRequest};
use super::require;
use crate::llm::prompt::PromptTemplate;
use crate::llm::provider::LlmProvider;
use crate::session::registry::SessionRegistry;
use crate::transcript::store::TranscriptStore;

/// Default page size for partition scans.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Construction options for [`ChatService`].
#[derive(Debug, Clone)]
pub struct ChatServiceOptions {
    pub template: PromptTemplate,
    pub generation: GenerationOptions,
    pub page_size: u32,
}

impl Default for ChatServiceOptions {
    fn default() -> Self {
        Self {
            template: PromptTemplate::default(),
            generation: GenerationOptions::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Service orchestrating sessions, turns and conversation reads.
///
/// Generic over the transcript store to keep parley-core free of any
/// database dependency.
pub struct ChatService<S: TranscriptStore> {
    store: Arc<S>,
    registry: Arc<SessionRegistry<S>>,
    coordinator: TurnCoordinator<S>,
    catalog: ConversationCatalog<S>,
    provider_name: String,
}

impl<S: TranscriptStore> ChatService<S> {
    pub fn new(store: Arc<S>, provider: Arc<dyn LlmProvider>, options: ChatServiceOptions) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let provider_name = provider.name().to_string();
        let coordinator = TurnCoordinator::new(
            Arc::clone(&registry),
            Arc::clone(&store),
            provider,
            options.template,
            options.generation,
        );
        let catalog = ConversationCatalog::new(Arc::clone(&store), options.page_size);

        Self {
            store,
            registry,
            coordinator,
            catalog,
            provider_name,
        }
    }

    pub fn registry(&self) -> &SessionRegistry<S> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    /// Open (or reopen) a session and return its id.
    ///
    /// A missing or empty `session_id` gets a fresh UUID v4. Nothing is
    /// written to the store until the first turn commits.
    pub fn start_session(&self, user_id: &str, session_id: Option<&str>) -> Result<String, ChatError> {
        require("userID", user_id)?;

        let session_id = match session_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        let key = SessionKey::new(user_id, session_id.clone());
        self.coordinator.bind(&key);

        tracing::info!(session = %key, "session started");
        Ok(session_id)
    }

    /// See [`TurnCoordinator::prepare`].
    pub async fn prepare_turn(&self, request: TurnRequest) -> Result<PreparedTurn<S>, ChatError> {
        self.coordinator.prepare(request).await
    }

    /// Full transcript of a conversation, read straight from the store.
    pub async fn history(&self, user_id: &str, session_id: &str) -> Result<Vec<ChatMessage>, ChatError> {
        require("userID", user_id)?;
        require("sessionID", session_id)?;

        let start = Instant::now();
        let key = SessionKey::new(user_id, session_id);
        let messages = self.store.read(&key).await?;

        tracing::info!(
            session = %key,
            count = messages.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Retrieved {} messages for session {} in {:?}",
            messages.len(),
            session_id,
            start.elapsed()
        );
        Ok(messages)
    }

    /// Summaries of every conversation the user has.
    pub async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>, ChatError> {
        require("userID", user_id)?;

        let start = Instant::now();
        let summaries = self.catalog.list_summaries(user_id).await?;

        tracing::info!(
            user = user_id,
            count = summaries.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Retrieved {} conversations for user {} in {:?}",
            summaries.len(),
            user_id,
            start.elapsed()
        );
        Ok(summaries)
    }

    /// Clear a conversation and evict its binding.
    ///
    /// Holds the session's turn slot for the whole operation: an in-flight
    /// turn commits before the clear, and a turn arriving meanwhile waits,
    /// then rebinds. Only the binding whose slot was held is evicted.
    pub async fn delete_conversation(&self, user_id: &str, session_id: &str) -> Result<(), ChatError> {
        require("userID", user_id)?;
        require("sessionID", session_id)?;

        let key = SessionKey::new(user_id, session_id);
        let (binding, _slot) = self.coordinator.acquire_current(&key).await;
        binding.transcript().clear().await?;
        self.registry.evict_current(&key, &binding);

        tracing::info!(session = %key, "conversation deleted");
        Ok(())
    }
}
