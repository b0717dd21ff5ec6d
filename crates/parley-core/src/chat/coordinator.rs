//! Turn coordinator.
//!
//! Runs one conversational turn through
//! `Validating -> Bound -> Generating -> Committing -> Done` (or `Failed`).
//!
//! A turn is split in two so the transport can report request problems with a
//! proper status before any body bytes exist:
//!
//! - [`TurnCoordinator::prepare`] validates, binds the session, waits for the
//!   session's turn slot, reads the transcript and opens the fragment stream.
//! - [`PreparedTurn::relay`] pulls fragments, writes and flushes each one to
//!   the sink, then commits the human input and the delivered reply.
//!
//! The turn slot is held from `prepare` until `relay` returns, so turns on one
//! session never interleave their appends.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;

use parley_types::chat::SessionKey;
use parley_types::error::{ChatError, PersistenceError};
use parley_types::llm::{GenerationError, GenerationRequest};

use super::require;
use super::sink::FragmentSink;
use crate::llm::prompt::PromptTemplate;
use crate::llm::provider::{FragmentStream, LlmProvider};
use crate::session::binding::SessionBinding;
use crate::session::registry::SessionRegistry;
use crate::transcript::store::TranscriptStore;

/// Written to the sink when a content-policy refusal produced no fragments.
pub const CONTENT_FILTER_APOLOGY: &str = "I apologize, but I can't respond to that request as it triggered the content filter. Please try rephrasing your question.";

/// Written to the sink when any other failure produced no fragments.
pub const GENERIC_APOLOGY: &str =
    "I apologize, but I encountered an error processing your request. Please try again later.";

/// User-facing text for a generation failure that produced nothing.
pub fn apology_for(error: &GenerationError) -> &'static str {
    if error.is_content_policy() {
        CONTENT_FILTER_APOLOGY
    } else {
        GENERIC_APOLOGY
    }
}

/// Model parameters applied to every turn.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Model or deployment name. Empty defers to the provider's default.
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: String::new(),
            max_tokens: 1024,
            temperature: None,
        }
    }
}

/// Input for one turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub user_id: String,
    pub session_id: String,
    pub message: String,
}

/// Turn lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Validating,
    Bound,
    Generating,
    Committing,
    Done,
    Failed,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TurnPhase::Validating => "validating",
            TurnPhase::Bound => "bound",
            TurnPhase::Generating => "generating",
            TurnPhase::Committing => "committing",
            TurnPhase::Done => "done",
            TurnPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What reached the transcript at the end of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    /// Human input and AI reply were both appended.
    Full,
    /// Only the human input was appended (no reply, or the reply append failed).
    HumanOnly,
    /// Nothing was appended.
    Failed,
}

/// Summary of a relayed turn. The reply text itself is not retained.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Fragments delivered to the sink.
    pub fragments: usize,
    /// Characters in the delivered reply.
    pub reply_chars: usize,
    pub committed: CommitStatus,
    /// Generation failure, if the provider stream ended with an error.
    pub failure: Option<GenerationError>,
    /// Persistence failure during commit. Logged, never sent to the client.
    pub commit_error: Option<PersistenceError>,
    /// The relay stopped early on cancellation or a broken sink.
    pub cancelled: bool,
    pub phase: TurnPhase,
}

fn enter(key: &SessionKey, phase: TurnPhase) {
    tracing::debug!(session = %key, %phase, "turn phase");
}

/// Orchestrates turns against the registry, store and provider.
pub struct TurnCoordinator<S: TranscriptStore> {
    registry: Arc<SessionRegistry<S>>,
    store: Arc<S>,
    provider: Arc<dyn LlmProvider>,
    template: PromptTemplate,
    options: GenerationOptions,
}

impl<S: TranscriptStore> TurnCoordinator<S> {
    pub fn new(
        registry: Arc<SessionRegistry<S>>,
        store: Arc<S>,
        provider: Arc<dyn LlmProvider>,
        template: PromptTemplate,
        options: GenerationOptions,
    ) -> Self {
        Self {
            registry,
            store,
            provider,
            template,
            options,
        }
    }

    /// Get or create the binding for `key`.
    pub fn bind(&self, key: &SessionKey) -> Arc<SessionBinding<S>> {
        self.registry.get_or_create(key, || {
            SessionBinding::new(
                key.clone(),
                self.template.clone(),
                Arc::clone(&self.provider),
                Arc::clone(&self.store),
            )
        })
    }

    /// Bind `key` and take its turn slot.
    ///
    /// A binding evicted while we waited for its slot (conversation deleted)
    /// is stale; rebind so every holder of the slot is the registered binding.
    pub(crate) async fn acquire_current(
        &self,
        key: &SessionKey,
    ) -> (Arc<SessionBinding<S>>, OwnedMutexGuard<()>) {
        loop {
            let binding = self.bind(key);
            let slot = binding.acquire_turn().await;
            let current = self
                .registry
                .get(key)
                .is_some_and(|current| Arc::ptr_eq(&current, &binding));
            if current {
                return (binding, slot);
            }
            tracing::debug!(session = %key, "binding evicted while waiting; rebinding");
        }
    }

    /// Validate, bind, take the turn slot, load the transcript and open the
    /// fragment stream.
    ///
    /// Nothing is written anywhere if this returns an error.
    pub async fn prepare(&self, request: TurnRequest) -> Result<PreparedTurn<S>, ChatError> {
        let TurnRequest {
            user_id,
            session_id,
            message,
        } = request;

        let key = SessionKey::new(user_id, session_id);
        enter(&key, TurnPhase::Validating);

        require("userID", &key.user_id)?;
        require("sessionID", &key.session_id)?;
        require("message", &message)?;

        let (binding, slot) = self.acquire_current(&key).await;
        enter(&key, TurnPhase::Bound);

        let history = binding.transcript().messages().await?;
        let prompt = binding.template().render(&history, &message);

        let request = GenerationRequest {
            model: self.options.model.clone(),
            prompt,
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };
        let stream = binding.provider().stream(request);

        tracing::debug!(
            session = %key,
            history = history.len(),
            provider = binding.provider().name(),
            "turn prepared"
        );

        Ok(PreparedTurn {
            key,
            binding,
            input: message,
            stream,
            _slot: slot,
            started: Instant::now(),
        })
    }

    /// Prepare and relay in one call.
    pub async fn run<K: FragmentSink>(
        &self,
        request: TurnRequest,
        sink: &mut K,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, ChatError> {
        let turn = self.prepare(request).await?;
        Ok(turn.relay(sink, cancel).await)
    }
}

/// A validated turn that owns its session's turn slot.
pub struct PreparedTurn<S: TranscriptStore> {
    key: SessionKey,
    binding: Arc<SessionBinding<S>>,
    input: String,
    stream: FragmentStream,
    _slot: OwnedMutexGuard<()>,
    started: Instant,
}

impl<S: TranscriptStore> PreparedTurn<S> {
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Stream the reply into `sink`, then commit.
    ///
    /// Stops pulling as soon as `cancel` fires or a sink write fails; the
    /// fragment stream is dropped and only the already-delivered prefix is
    /// committed. A failure with nothing delivered writes an apology into the
    /// sink instead; that apology is not recorded in the transcript.
    pub async fn relay<K: FragmentSink>(self, sink: &mut K, cancel: &CancellationToken) -> TurnOutcome {
        let PreparedTurn {
            key,
            binding,
            input,
            mut stream,
            _slot,
            started,
        } = self;

        enter(&key, TurnPhase::Generating);

        let mut reply = String::new();
        let mut fragments = 0usize;
        let mut failure: Option<GenerationError> = None;
        let mut cancelled = false;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(session = %key, fragments, "turn cancelled");
                    cancelled = true;
                    break;
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(fragment)) => {
                    if fragment.is_empty() {
                        continue;
                    }
                    if let Err(e) = deliver(sink, &fragment).await {
                        tracing::warn!(session = %key, error = %e, "client went away mid-stream");
                        cancelled = true;
                        break;
                    }
                    reply.push_str(&fragment);
                    fragments += 1;
                }
                Some(Err(e)) => {
                    tracing::error!(session = %key, error = %e, fragments, "generation failed");
                    failure = Some(e);
                    break;
                }
                None => break,
            }
        }
        drop(stream);

        let generation_failed = failure.is_some() && fragments == 0;
        if let (Some(e), 0) = (&failure, fragments) {
            if !cancelled {
                if let Err(te) = deliver(sink, apology_for(e)).await {
                    tracing::warn!(session = %key, error = %te, "could not deliver apology");
                }
            }
        }

        enter(&key, TurnPhase::Committing);
        let transcript = binding.transcript();
        let mut commit_error = None;
        let committed = match transcript.add_user_message(&input).await {
            Err(e) => {
                tracing::error!(session = %key, error = %e, "failed to record human input");
                commit_error = Some(e);
                CommitStatus::Failed
            }
            Ok(()) if reply.is_empty() => CommitStatus::HumanOnly,
            Ok(()) => match transcript.add_ai_message(&reply).await {
                Ok(()) => CommitStatus::Full,
                Err(e) => {
                    tracing::error!(session = %key, error = %e, "failed to record AI reply");
                    commit_error = Some(e);
                    CommitStatus::HumanOnly
                }
            },
        };

        let phase = if generation_failed || committed == CommitStatus::Failed {
            TurnPhase::Failed
        } else {
            TurnPhase::Done
        };
        enter(&key, phase);

        let reply_chars = reply.chars().count();
        tracing::info!(
            session = %key,
            fragments,
            reply_chars,
            cancelled,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "turn finished"
        );

        TurnOutcome {
            fragments,
            reply_chars,
            committed,
            failure,
            commit_error,
            cancelled,
            phase,
        }
    }
}

async fn deliver<K: FragmentSink>(sink: &mut K, fragment: &str) -> Result<(), parley_types::error::TransportError> {
    sink.write(fragment).await?;
    sink.flush().await
}
