//! Interactive streaming chat client for a LiteLLM-compatible gateway.
//!
//! ## Configuration
//!
//! Runtime configuration is resolved from the environment:
//!
//! - `LITELLM_BASE_URL` — gateway base URL (default `http://localhost:4000`)
//! - `LITELLM_API_KEY` — optional bearer token
//! - `LLM_MODEL` — model sent on each turn; the persisted `/model` override
//!   takes precedence when set
//! - `DB_PATH` — SQLite conversation database (default `clichat.db`)
//! - `STATE_PATH` — persisted session override file (default `state.json`)
//! - `SYSTEM_PROMPT` — system message prepended to every request
//! - `TEMPERATURE`, `TOP_P` — sampling parameters (defaults 0.2 / 1.0)
//! - `MODEL_CONTEXT_TOKENS` — context window capacity; 0 reports usage as
//!   unavailable
//! - `HISTORY_LIMIT` — cap on stored messages loaded per turn (default 200)
//! - `ENABLE_PROVIDER_WEBSEARCH` — declare the provider `web_search` tool
//! - `DROP_SAMPLING_PARAMS` — omit sampling parameters for every model
//! - `NO_SAMPLING_MODEL_PREFIXES` — comma-separated model-name prefixes for
//!   which sampling parameters are omitted (default `gpt-5`)
//!
//! Invalid numeric or boolean values fall back to their defaults.
//!
//! ## Turn contract
//!
//! [`chat::ChatService::run_turn`] executes one turn: the user message is
//! persisted before any network call, the resend window is a contiguous
//! suffix of stored history, and finalization runs exactly once per turn no
//! matter how the stream ends — the accumulated partial output is persisted
//! as a single assistant message even on provider errors or cancellation.

pub mod budget;
pub mod chat;
pub mod commands;
pub mod config;
pub mod history;
pub mod render;
pub mod state;
