//! Conversation, message, and session key types for Parley.
//!
//! A conversation is an ordered, append-only list of messages identified by
//! `(user_id, session_id)`. The user id is the partition key; the session id
//! is the document identity within that partition.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Author of a message within a conversation.
///
/// Stored documents may carry role tags written by other tools; anything this
/// build does not recognise decodes to `Unknown` instead of failing the read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Human,
    Ai,
    System,
    #[serde(other)]
    Unknown,
}

impl MessageRole {
    /// Wire tag used in stored documents and the history API (`human`, `ai`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::Human => "human",
            MessageRole::Ai => "ai",
            MessageRole::System => "system",
            MessageRole::Unknown => "unknown",
        }
    }

    /// Speaker label used when a transcript is rendered into a prompt.
    pub fn speaker(&self) -> &'static str {
        match self {
            MessageRole::Human => "Human",
            MessageRole::Ai => "AI",
            MessageRole::System => "System",
            MessageRole::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message within a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Human, content)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Ai, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }
}

/// Identity of a conversation: partition (user) plus document (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.session_id)
    }
}

/// A conversation document as held by a transcript store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub user_id: String,
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Project this document into its listing summary.
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            session_id: self.session_id.clone(),
            message_count: self.messages.len(),
        }
    }
}

/// Read-only projection of a conversation computed at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub session_id: String,
    pub message_count: usize,
}

/// One page of a partition scan.
///
/// `next_cursor` is `None` once the partition is exhausted. Cursors are opaque
/// to callers and only meaningful to the store that issued them.
#[derive(Debug, Clone, Default)]
pub struct ConversationPage {
    pub conversations: Vec<Conversation>,
    pub next_cursor: Option<String>,
}
