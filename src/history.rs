use conversation_store::{Message, Role};

/// Maximum unanswered messages resent while no assistant reply exists yet.
const MAX_UNANSWERED_RESEND: usize = 2;

/// Chooses the contiguous suffix of stored history to resend as context.
///
/// With at least one assistant message present, the window starts at the most
/// recent assistant message (inclusive). Before the first reply, at most the
/// last two messages go back out so an unanswered backlog is not resent
/// repeatedly.
#[must_use]
pub fn select_resend_window(messages: &[Message]) -> &[Message] {
    match messages
        .iter()
        .rposition(|message| message.role == Role::Assistant)
    {
        Some(start) => &messages[start..],
        None => &messages[messages.len().saturating_sub(MAX_UNANSWERED_RESEND)..],
    }
}
