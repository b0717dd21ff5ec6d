//! Application error type mapping to HTTP status codes and `{error}` bodies.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use parley_types::error::ChatError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Validation or persistence failure from the chat service.
    Chat(ChatError),
    /// Request body or query string could not be decoded.
    MalformedRequest(String),
    /// Route exists but not for this method.
    MethodNotAllowed,
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        AppError::MalformedRequest(e.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        AppError::MalformedRequest(e.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Chat(ChatError::Validation(e)) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Chat(ChatError::Persistence(e)) => {
                tracing::error!(error = %e, "storage operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::MalformedRequest(detail) => {
                tracing::debug!(%detail, "rejected malformed request");
                (StatusCode::BAD_REQUEST, "Invalid request format".to_string())
            }
            AppError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Fallback for a known path hit with the wrong method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
