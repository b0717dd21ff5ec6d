//! Generation request and error types for Parley.
//!
//! The language model is a black box to the rest of the system: it receives a
//! rendered prompt and produces a lazy sequence of text fragments, or fails.

use serde::{Deserialize, Serialize};

/// Marker that identifies a provider refusal on content-policy grounds.
///
/// Matched case-insensitively against the provider's error text.
pub const CONTENT_POLICY_MARKER: &str = "content management policy";

/// Request sent to a generation provider for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model or deployment name. Empty means "use the provider default".
    pub model: String,
    /// Fully rendered prompt (prior transcript plus the new human input).
    pub prompt: String,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Errors from generation provider operations.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("response blocked by content filter: {0}")]
    ContentFiltered(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("stream error: {0}")]
    Stream(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GenerationError {
    /// Whether this failure is a content-policy refusal rather than a fault.
    pub fn is_content_policy(&self) -> bool {
        matches!(self, GenerationError::ContentFiltered(_))
            || self
                .to_string()
                .to_lowercase()
                .contains(CONTENT_POLICY_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_policy_marker_is_case_insensitive() {
        let err = GenerationError::Provider {
            message: "The response was filtered due to the prompt triggering Azure OpenAI's Content Management Policy.".to_string(),
        };
        assert!(err.is_content_policy());
    }

    #[test]
    fn test_content_filtered_variant_is_content_policy() {
        let err = GenerationError::ContentFiltered("finish_reason=content_filter".to_string());
        assert!(err.is_content_policy());
    }

    #[test]
    fn test_generic_failure_is_not_content_policy() {
        let err = GenerationError::Stream("connection reset".to_string());
        assert!(!err.is_content_policy());
        assert!(!GenerationError::AuthenticationFailed.is_content_policy());
    }

    #[test]
    fn test_generation_request_skips_missing_temperature() {
        let request = GenerationRequest {
            model: "gpt-4o".to_string(),
            prompt: "Hello".to_string(),
            max_tokens: 256,
            temperature: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("temperature"));
    }
}
