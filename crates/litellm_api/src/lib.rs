//! Transport-only client primitives for a LiteLLM-compatible gateway.
//!
//! This crate owns request building, event-stream parsing, and retry behavior
//! for the gateway's chat-completion and model-listing endpoints only. It
//! intentionally contains no persistence and no interactive-loop coupling.
//!
//! Streaming contract: [`LiteLlmClient::stream_chat`] yields a [`ChatStream`]
//! delivering fragments in provider-emitted order followed by exactly one
//! terminal event. Malformed `data:` payloads are skipped under an explicit
//! tolerant-parsing policy; the skip count travels on the terminal
//! [`StreamEvent::Completed`] event so noisy upstream framing stays
//! diagnosable.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod payload;
pub mod retry;
pub mod sse;
pub mod url;

pub use client::{CancellationSignal, ChatStream, LiteLlmClient};
pub use config::LiteLlmConfig;
pub use error::LiteLlmError;
pub use events::StreamEvent;
pub use payload::{ChatMessage, ChatRequest, ModelInfo, ModelsResponse, ToolSpec};
pub use sse::EventLineParser;
pub use url::normalize_base_url;
