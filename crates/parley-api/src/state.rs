//! Application state wiring the chat service to its store and provider.
//!
//! AppState holds the concrete service instance used by both the CLI and the
//! HTTP API. `ChatService` is generic over the transcript store; AppState pins
//! it to [`AnyTranscriptStore`], the backend chosen in configuration.

use std::sync::Arc;

use anyhow::Context;

use parley_core::chat::coordinator::GenerationOptions;
use parley_core::chat::service::{ChatService, ChatServiceOptions};
use parley_core::llm::prompt::PromptTemplate;
use parley_infra::llm::create_provider;
use parley_infra::store::AnyTranscriptStore;
use parley_types::config::AppConfig;

/// Chat service pinned to the configured store backend.
pub type ConcreteChatService = ChatService<AnyTranscriptStore>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
}

impl AppState {
    /// Open the store, build the provider and wire the chat service.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let store = AnyTranscriptStore::from_config(&config.store)
            .await
            .with_context(|| format!("failed to open store at {}", config.store.database_url))?;

        let provider = create_provider(&config.llm).context("failed to configure llm provider")?;

        let options = ChatServiceOptions {
            template: PromptTemplate::default(),
            generation: GenerationOptions {
                model: config.llm.model.clone().unwrap_or_default(),
                max_tokens: config.llm.max_tokens,
                temperature: config.llm.temperature,
            },
            page_size: config.store.page_size,
        };

        tracing::info!(
            store = store.backend_name(),
            provider = provider.name(),
            "chat service ready"
        );

        Ok(Self::new(ChatService::new(Arc::new(store), provider, options)))
    }

    pub fn new(chat_service: ConcreteChatService) -> Self {
        Self {
            chat_service: Arc::new(chat_service),
        }
    }
}
