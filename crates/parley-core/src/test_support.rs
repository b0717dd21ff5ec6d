//! Scripted doubles shared by the unit tests in this crate.

use std::sync::Mutex;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use parley_types::error::TransportError;
use parley_types::llm::{GenerationError, GenerationRequest};

use crate::chat::sink::FragmentSink;
use crate::llm::provider::{FragmentStream, LlmProvider};

/// One step of a scripted generation.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Say(&'static str),
    /// Yield `echo: <last prompt line>`.
    EchoInput,
    Fail(&'static str),
    ContentFilter,
    Wait(Duration),
    Hang,
}

/// Provider that replays the same script on every call and records prompts.
pub(crate) struct ScriptedProvider {
    script: Vec<Step>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub(crate) fn new(script: Vec<Step>) -> Self {
        Self {
            script,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn stream(&self, request: GenerationRequest) -> FragmentStream {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let script = self.script.clone();
        let last_line = request.prompt.lines().last().unwrap_or_default().to_string();

        Box::pin(async_stream::stream! {
            for step in script {
                match step {
                    Step::Say(text) => yield Ok(text.to_string()),
                    Step::EchoInput => yield Ok(format!("echo: {last_line}")),
                    Step::Fail(message) => {
                        yield Err(GenerationError::Provider { message: message.to_string() });
                        return;
                    }
                    Step::ContentFilter => {
                        yield Err(GenerationError::ContentFiltered("finish_reason=content_filter".to_string()));
                        return;
                    }
                    Step::Wait(delay) => tokio::time::sleep(delay).await,
                    Step::Hang => futures_util::future::pending::<()>().await,
                }
            }
        })
    }
}

/// Sink that records writes and can be told to fail or cancel.
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub(crate) chunks: Vec<String>,
    pub(crate) flushes: usize,
    /// Fail every write once this many chunks were accepted.
    pub(crate) fail_after: Option<usize>,
    /// Cancel the token once this many chunks were accepted.
    pub(crate) cancel_after: Option<(usize, CancellationToken)>,
}

impl RecordingSink {
    pub(crate) fn body(&self) -> String {
        self.chunks.concat()
    }
}

impl FragmentSink for RecordingSink {
    async fn write(&mut self, fragment: &str) -> Result<(), TransportError> {
        if self.fail_after.is_some_and(|limit| self.chunks.len() >= limit) {
            return Err(TransportError("connection closed".to_string()));
        }
        self.chunks.push(fragment.to_string());
        if let Some((limit, token)) = &self.cancel_after {
            if self.chunks.len() >= *limit {
                token.cancel();
            }
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        self.flushes += 1;
        Ok(())
    }
}
