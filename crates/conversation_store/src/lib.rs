//! SQLite-backed conversation memory.
//!
//! One row per conversation with cumulative usage aggregates, one append-only
//! row per message. Ordering is strictly by insertion; a read-back reproduces
//! exactly what was appended. The handle is opened once per process and the
//! caller sequences turns, so no locking beyond SQLite's own is required.
//!
//! Older database files predate the usage columns; [`ConversationStore::open`]
//! adds them in place via guarded `ALTER TABLE` migrations.

pub mod error;
pub mod schema;
pub mod store;

pub use error::StoreError;
pub use schema::{Conversation, Message, Role};
pub use store::ConversationStore;
