//! Read-only conversation endpoints.
//!
//! - GET /api/chat/history?userID=..&sessionID=..
//! - GET /api/user/conversations?userID=..
//!
//! Both read the store directly and never create a session binding.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use parley_types::chat::{ChatMessage, ConversationSummary};

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(rename = "userID", default)]
    pub user_id: String,
    #[serde(rename = "sessionID", default)]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ConversationsQuery {
    #[serde(rename = "userID", default)]
    pub user_id: String,
}

/// One transcript entry as the client sees it.
#[derive(Debug, Serialize)]
pub struct MessageDto {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub content: String,
}

impl From<ChatMessage> for MessageDto {
    fn from(message: ChatMessage) -> Self {
        Self {
            kind: message.role.as_str(),
            content: message.content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<MessageDto>,
}

#[derive(Debug, Serialize)]
pub struct ConversationDto {
    #[serde(rename = "sessionID")]
    pub session_id: String,
    #[serde(rename = "messageCount")]
    pub message_count: usize,
}

impl From<ConversationSummary> for ConversationDto {
    fn from(summary: ConversationSummary) -> Self {
        Self {
            session_id: summary.session_id,
            message_count: summary.message_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<ConversationDto>,
}

/// GET /api/chat/history - full transcript of one conversation.
pub async fn get_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    let Query(query) = query?;

    let messages = state
        .chat_service
        .history(&query.user_id, &query.session_id)
        .await?;

    Ok(Json(HistoryResponse {
        messages: messages.into_iter().map(MessageDto::from).collect(),
    }))
}

/// GET /api/user/conversations - every conversation of a user with its size.
pub async fn list_conversations(
    State(state): State<AppState>,
    query: Result<Query<ConversationsQuery>, QueryRejection>,
) -> Result<Json<ConversationsResponse>, AppError> {
    let Query(query) = query?;

    let summaries = state.chat_service.list_conversations(&query.user_id).await?;

    Ok(Json(ConversationsResponse {
        conversations: summaries.into_iter().map(ConversationDto::from).collect(),
    }))
}
