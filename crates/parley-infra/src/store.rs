//! Runtime-selected transcript store.
//!
//! `TranscriptStore` uses RPITIT and is not object-safe, so the backend chosen
//! in configuration is carried as an enum that delegates each call.

use parley_core::transcript::memory::MemoryTranscriptStore;
use parley_core::transcript::store::TranscriptStore;
use parley_types::chat::{ChatMessage, ConversationPage, SessionKey};
use parley_types::config::{StoreBackend, StoreConfig};
use parley_types::error::PersistenceError;

use crate::sqlite::pool::DatabasePool;
use crate::sqlite::transcript::SqliteTranscriptStore;

/// Transcript store selected by `store.backend`.
pub enum AnyTranscriptStore {
    Sqlite(SqliteTranscriptStore),
    Memory(MemoryTranscriptStore),
}

impl AnyTranscriptStore {
    /// Open the configured backend. SQLite runs its migrations here.
    pub async fn from_config(config: &StoreConfig) -> Result<Self, sqlx::Error> {
        match config.backend {
            StoreBackend::Sqlite => {
                let pool = DatabasePool::new(&config.database_url).await?;
                Ok(Self::Sqlite(SqliteTranscriptStore::new(pool)))
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory transcript store; conversations are lost on restart");
                Ok(Self::Memory(MemoryTranscriptStore::new()))
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Memory(_) => "memory",
        }
    }
}

impl TranscriptStore for AnyTranscriptStore {
    async fn append(&self, key: &SessionKey, message: &ChatMessage) -> Result<(), PersistenceError> {
        match self {
            Self::Sqlite(store) => store.append(key, message).await,
            Self::Memory(store) => store.append(key, message).await,
        }
    }

    async fn read(&self, key: &SessionKey) -> Result<Vec<ChatMessage>, PersistenceError> {
        match self {
            Self::Sqlite(store) => store.read(key).await,
            Self::Memory(store) => store.read(key).await,
        }
    }

    async fn clear(&self, key: &SessionKey) -> Result<(), PersistenceError> {
        match self {
            Self::Sqlite(store) => store.clear(key).await,
            Self::Memory(store) => store.clear(key).await,
        }
    }

    async fn list_page(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<ConversationPage, PersistenceError> {
        match self {
            Self::Sqlite(store) => store.list_page(user_id, cursor, page_size).await,
            Self::Memory(store) => store.list_page(user_id, cursor, page_size).await,
        }
    }
}
