//! LlmProvider trait definition.
//!
//! A provider turns a rendered prompt into a lazy, finite sequence of text
//! fragments. Nothing is sent upstream until the stream is first polled, and
//! dropping the stream aborts the request.

use std::pin::Pin;

use futures_util::Stream;

use parley_types::llm::{GenerationError, GenerationRequest};

/// Boxed fragment stream returned by [`LlmProvider::stream`].
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, GenerationError>> + Send + 'static>>;

/// Trait for generation backends (OpenAI-compatible endpoints, echo, ...).
///
/// Object-safe so the service can hold one provider as `Arc<dyn LlmProvider>`
/// and share it across every session binding.
///
/// Implementations live in parley-infra (e.g., `OpenAiCompatibleProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai", "echo").
    fn name(&self) -> &str;

    /// Start generating a reply. Errors, including refusals, surface as
    /// stream items.
    fn stream(&self, request: GenerationRequest) -> FragmentStream;
}
