use std::future::Future;
use std::sync::Arc;

use conversation_store::{ConversationStore, Role, StoreError};
use litellm_api::{
    CancellationSignal, ChatMessage, ChatRequest, ChatStream, LiteLlmClient, LiteLlmError,
    StreamEvent, ToolSpec,
};
use log::warn;
use thiserror::Error;

use crate::budget::{estimate_tokens, estimate_tokens_total, percent_used};
use crate::config::SamplingExclusion;
use crate::history::select_resend_window;
use crate::render::Renderer;

/// Turn-level failure taxonomy.
///
/// `Validation` and early store failures surface before any network call;
/// stream failures and cancellation surface only after finalization has been
/// attempted, so partial output is never lost to an error path.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Stream(LiteLlmError),

    #[error("turn was cancelled")]
    Cancelled,
}

impl From<LiteLlmError> for ChatError {
    fn from(error: LiteLlmError) -> Self {
        match error {
            LiteLlmError::Cancelled => Self::Cancelled,
            other => Self::Stream(other),
        }
    }
}

/// Per-turn orchestrator configuration, fixed at construction.
#[derive(Clone)]
pub struct ChatConfig {
    pub model: String,
    pub system_prompt: Option<String>,
    pub temperature: f64,
    pub top_p: f64,
    /// Context window capacity in tokens; `None` reports usage as unavailable.
    pub context_window_tokens: Option<i64>,
    /// Cap on stored messages loaded per turn before windowing.
    pub history_limit: usize,
    pub enable_provider_websearch: bool,
    /// Models for which sampling parameters are omitted from requests.
    pub omit_sampling_params: SamplingExclusion,
}

/// Seam over the transport client so turns can be driven by scripted
/// streams in tests.
pub trait ChatStreamer {
    /// Opens one streaming completion for the prepared request.
    fn open_stream(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> impl Future<Output = Result<ChatStream, LiteLlmError>> + Send;
}

impl ChatStreamer for LiteLlmClient {
    async fn open_stream(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<ChatStream, LiteLlmError> {
        self.stream_chat(request, cancellation).await
    }
}

impl<S: ChatStreamer + Sync> ChatStreamer for Arc<S> {
    async fn open_stream(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<ChatStream, LiteLlmError> {
        (**self).open_stream(request, cancellation).await
    }
}

/// Context-usage report for a finished turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageReport {
    /// No context window capacity configured.
    Unavailable,
    Window {
        used: i64,
        capacity: i64,
        percent: String,
    },
}

/// Outcome of one finalized turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub assistant_text: String,
    pub prompt_tokens: i64,
    pub answer_tokens: i64,
    pub usage: UsageReport,
}

/// Accumulated assistant output for one turn, with the finalize-once guard.
#[derive(Debug, Default)]
struct TurnTranscript {
    text: String,
    finalized: bool,
}

/// Executes one user turn end to end against a conversation.
pub struct ChatService<S: ChatStreamer, R: Renderer> {
    config: ChatConfig,
    store: ConversationStore,
    streamer: S,
    renderer: R,
}

impl<S: ChatStreamer, R: Renderer> ChatService<S, R> {
    pub fn new(config: ChatConfig, store: ConversationStore, streamer: S, renderer: R) -> Self {
        Self {
            config,
            store,
            streamer,
            renderer,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Switches the model used by subsequent turns.
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.config.model = model.into();
    }

    /// Runs one turn: validate, persist input, build the bounded context
    /// window, stream the reply, and finalize exactly once regardless of how
    /// the stream ended.
    pub async fn run_turn(
        &mut self,
        conversation_id: &str,
        text: &str,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<TurnOutcome, ChatError> {
        let conversation_id = conversation_id.trim();
        if conversation_id.is_empty() {
            return Err(ChatError::Validation(
                "conversation id required".to_string(),
            ));
        }

        self.store
            .create_or_get_conversation(conversation_id, conversation_id)?;
        // The user message lands before any network call so input survives a
        // failed turn.
        self.store
            .append_message(conversation_id, Role::User, text)?;

        let (request, prompt_tokens) = self.build_request(conversation_id)?;

        let mut transcript = TurnTranscript::default();
        let streamed = self
            .consume_stream(&request, cancellation, &mut transcript)
            .await;
        let finalized = self.finalize_turn(conversation_id, &mut transcript, prompt_tokens);

        match streamed {
            Ok(()) => finalized,
            Err(error) => {
                if let Err(finalize_error) = finalized {
                    warn!("failed to finalize interrupted turn: {finalize_error}");
                }
                Err(error)
            }
        }
    }

    fn build_request(&self, conversation_id: &str) -> Result<(ChatRequest, i64), ChatError> {
        let stored = self
            .store
            .recent_messages(conversation_id, self.config.history_limit)?;
        let window = select_resend_window(&stored);

        let mut messages = Vec::with_capacity(window.len() + 1);
        if let Some(system_prompt) = self
            .config
            .system_prompt
            .as_deref()
            .filter(|prompt| !prompt.is_empty())
        {
            messages.push(ChatMessage::new("system", system_prompt));
        }
        for message in window {
            messages.push(ChatMessage::new(message.role.as_str(), &message.content));
        }

        // Estimated over the exact message set sent, system prompt included.
        let prompt_tokens =
            estimate_tokens_total(messages.iter().map(|message| message.content.as_str()));

        let mut request = ChatRequest::new(self.config.model.clone(), messages);
        if !(self.config.omit_sampling_params)(&self.config.model) {
            request.temperature = Some(self.config.temperature);
            request.top_p = Some(self.config.top_p);
        }
        if self.config.enable_provider_websearch {
            request.tools.push(ToolSpec::web_search());
        }

        Ok((request, prompt_tokens))
    }

    async fn consume_stream(
        &mut self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
        transcript: &mut TurnTranscript,
    ) -> Result<(), ChatError> {
        let mut stream = self.streamer.open_stream(request, cancellation).await?;

        loop {
            match stream.next_event().await {
                Some(StreamEvent::Fragment(fragment)) => {
                    transcript.text.push_str(&fragment);
                    // Already-rendered output is never retracted, and a
                    // rendering failure must not abort the turn.
                    if let Err(error) = self.renderer.render_fragment(&fragment) {
                        warn!("failed to render fragment: {error}");
                    }
                }
                Some(StreamEvent::Completed { skipped_lines }) => {
                    if skipped_lines > 0 {
                        warn!("stream skipped {skipped_lines} malformed event line(s)");
                    }
                    return Ok(());
                }
                Some(StreamEvent::Failed(error)) => return Err(error.into()),
                Some(StreamEvent::Cancelled) => return Err(ChatError::Cancelled),
                None => return Err(ChatError::Stream(LiteLlmError::MissingTerminal)),
            }
        }
    }

    /// Exactly-once turn finalization.
    ///
    /// Persists non-empty accumulated output as a single assistant message
    /// and folds this turn's estimates into the conversation aggregates. A
    /// second invocation for the same transcript performs no writes.
    fn finalize_turn(
        &mut self,
        conversation_id: &str,
        transcript: &mut TurnTranscript,
        prompt_tokens: i64,
    ) -> Result<TurnOutcome, ChatError> {
        let answer_tokens = estimate_tokens(&transcript.text);
        let first_invocation = !transcript.finalized;
        // The guard flips before the writes so a failed finalize is not
        // retried into a duplicate assistant message.
        transcript.finalized = true;

        if first_invocation && !transcript.text.is_empty() {
            self.store
                .append_message(conversation_id, Role::Assistant, &transcript.text)?;
            self.store
                .update_usage(conversation_id, prompt_tokens, answer_tokens, 1, 1)?;
        }

        Ok(TurnOutcome {
            assistant_text: transcript.text.clone(),
            prompt_tokens,
            answer_tokens,
            usage: self.usage_report(prompt_tokens + answer_tokens),
        })
    }

    fn usage_report(&self, used: i64) -> UsageReport {
        match self.config.context_window_tokens {
            Some(capacity) if capacity > 0 => UsageReport::Window {
                used,
                capacity,
                percent: percent_used(used, capacity),
            },
            _ => UsageReport::Unavailable,
        }
    }
}
