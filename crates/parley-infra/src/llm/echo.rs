//! Offline echo provider.
//!
//! Streams the human input back word by word. Lets the service run end to end
//! without network access or credentials.

use std::time::Duration;

use parley_core::llm::provider::{FragmentStream, LlmProvider};
use parley_types::llm::{GenerationError, GenerationRequest};

/// Provider that replies with the last line of the prompt.
#[derive(Debug, Clone, Default)]
pub struct EchoProvider {
    /// Pause between fragments, to make streaming visible in a browser.
    delay: Option<Duration>,
}

impl EchoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }
}

/// Split `input` into fragments that concatenate back to it exactly.
fn fragments(input: &str) -> Vec<String> {
    input
        .split_inclusive(char::is_whitespace)
        .map(str::to_string)
        .collect()
}

impl LlmProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    fn stream(&self, request: GenerationRequest) -> FragmentStream {
        let input = request.prompt.lines().last().unwrap_or_default().to_string();
        let delay = self.delay;

        Box::pin(async_stream::stream! {
            for fragment in fragments(&input) {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                yield Ok::<_, GenerationError>(fragment);
            }
        })
    }
}
