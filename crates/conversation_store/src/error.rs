use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conversation id required")]
    EmptyConversationId,

    #[error("failed to open conversation database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("{operation} failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("message {seq} has unknown role '{value}'")]
    UnknownRole { seq: i64, value: String },
}

impl StoreError {
    #[must_use]
    pub(crate) fn query(operation: &'static str, source: rusqlite::Error) -> Self {
        Self::Query { operation, source }
    }
}
