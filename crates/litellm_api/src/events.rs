use crate::error::LiteLlmError;

/// Item delivered to the single consumer of a chat stream.
///
/// A stream yields zero or more `Fragment`s in provider-emitted order and
/// then exactly one terminal event; nothing follows a terminal.
#[derive(Debug)]
pub enum StreamEvent {
    /// Incremental assistant text.
    Fragment(String),
    /// Normal end of stream, with the count of malformed data lines skipped
    /// under the tolerant-parsing policy.
    Completed { skipped_lines: u64 },
    /// Failure after zero or more fragments were already delivered.
    Failed(LiteLlmError),
    /// Cooperative cancellation observed by the producer.
    Cancelled,
}

impl StreamEvent {
    /// Returns true when this event terminates the stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed(_) | Self::Cancelled
        )
    }
}
