//! Session lifecycle and streaming turn endpoints.
//!
//! - POST /api/chat/start
//! - POST /api/chat/stream
//! - POST /api/chat/delete
//!
//! The stream endpoint answers with a raw `text/plain` body: reply fragments
//! are written as the provider produces them, with no framing or envelope.
//! Validation and store failures that happen before the first byte still get a
//! JSON error; anything after that is reported in-band by the coordinator.

use std::convert::Infallible;

use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use parley_core::chat::coordinator::TurnRequest;

use crate::http::error::AppError;
use crate::http::sink::ChannelSink;
use crate::state::AppState;

/// Fragments buffered between the relay task and the response body.
const BODY_CHANNEL_CAPACITY: usize = 32;

/// Request body for POST /api/chat/start.
#[derive(Debug, Deserialize)]
pub struct StartChatRequest {
    #[serde(rename = "userID", default)]
    pub user_id: String,
    #[serde(rename = "sessionID", default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartChatResponse {
    #[serde(rename = "sessionID")]
    pub session_id: String,
    pub success: bool,
}

/// Request body for POST /api/chat/stream.
#[derive(Debug, Deserialize)]
pub struct StreamChatRequest {
    #[serde(rename = "userID", default)]
    pub user_id: String,
    #[serde(rename = "sessionID", default)]
    pub session_id: String,
    #[serde(default)]
    pub message: String,
}

/// Request body for POST /api/chat/delete.
#[derive(Debug, Deserialize)]
pub struct DeleteChatRequest {
    #[serde(rename = "userID", default)]
    pub user_id: String,
    #[serde(rename = "sessionID", default)]
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// POST /api/chat/start - open a session, generating an id when none is given.
pub async fn start_chat(
    State(state): State<AppState>,
    payload: Result<Json<StartChatRequest>, JsonRejection>,
) -> Result<Json<StartChatResponse>, AppError> {
    let Json(body) = payload?;

    let session_id = state
        .chat_service
        .start_session(&body.user_id, body.session_id.as_deref())?;

    Ok(Json(StartChatResponse {
        session_id,
        success: true,
    }))
}

/// POST /api/chat/stream - run one turn, streaming the reply as plain text.
///
/// The turn is prepared (validated, slot acquired, history loaded) before the
/// response starts. The relay then runs on its own task; dropping the
/// response body cancels it.
pub async fn stream_chat(
    State(state): State<AppState>,
    payload: Result<Json<StreamChatRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = payload?;

    let turn = state
        .chat_service
        .prepare_turn(TurnRequest {
            user_id: body.user_id,
            session_id: body.session_id,
            message: body.message,
        })
        .await?;

    let (tx, mut rx) = mpsc::channel::<Bytes>(BODY_CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();
    let body_guard = cancel.clone().drop_guard();

    tokio::spawn(async move {
        let mut sink = ChannelSink::new(tx);
        let session = turn.key().to_string();
        let outcome = turn.relay(&mut sink, &cancel).await;
        tracing::debug!(
            %session,
            phase = %outcome.phase,
            committed = ?outcome.committed,
            "stream closed"
        );
    });

    let body_stream = async_stream::stream! {
        let _body_guard = body_guard;
        while let Some(chunk) = rx.recv().await {
            yield Ok::<_, Infallible>(chunk);
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(body_stream),
    )
        .into_response())
}

/// POST /api/chat/delete - clear a conversation and forget its binding.
pub async fn delete_chat(
    State(state): State<AppState>,
    payload: Result<Json<DeleteChatRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Json(body) = payload?;

    state
        .chat_service
        .delete_conversation(&body.user_id, &body.session_id)
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}
