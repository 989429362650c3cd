//! Handoff detection
//!
//! A conversation is complete once the bot's latest reply says it is
//! connecting the user to a human. Only the most recent message counts.

use crate::message::{Message, Sender};

/// Lowercase phrases that signal a handoff. Overlapping entries are
/// harmless: any substring match is a single trigger.
pub const HANDOFF_PHRASES: &[&str] = &[
    "connecting you to an agent",
    "connecting you to a human agent",
    "connecting you to",
    "connect you to",
    "connect to an agent",
    "connect to a human",
];

pub fn is_handoff_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    HANDOFF_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Whether the history ends with a bot handoff
pub fn is_complete(messages: &[Message]) -> bool {
    messages
        .last()
        .is_some_and(|last| last.sender == Sender::Bot && is_handoff_text(&last.display_text()))
}
