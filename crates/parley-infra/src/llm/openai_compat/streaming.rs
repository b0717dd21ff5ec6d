//! OpenAI SSE stream to text fragment adapter.
//!
//! Maps `async-openai`'s [`ChatCompletionResponseStream`] chunks to the plain
//! text fragments the turn coordinator relays. A `content_filter` finish
//! reason ends the stream with [`GenerationError::ContentFiltered`].

use futures_util::StreamExt;

use async_openai::types::chat::{ChatCompletionResponseStream, FinishReason};

use parley_core::llm::provider::FragmentStream;
use parley_types::llm::GenerationError;

use super::map_openai_error;

/// Map an async-openai [`ChatCompletionResponseStream`] to a fragment stream.
///
/// Empty deltas (role-only first chunks, usage chunks) are skipped.
pub fn map_chat_stream(stream: ChatCompletionResponseStream) -> FragmentStream {
    Box::pin(async_stream::try_stream! {
        let mut stream = stream;

        while let Some(result) = stream.next().await {
            let chunk = result.map_err(map_openai_error)?;

            for choice in chunk.choices {
                if let Some(text) = choice.delta.content {
                    if !text.is_empty() {
                        yield text;
                    }
                }

                if matches!(choice.finish_reason, Some(FinishReason::ContentFilter)) {
                    Err(GenerationError::ContentFiltered(
                        "finish_reason=content_filter".to_string(),
                    ))?;
                }
            }
        }
    })
}
