//! Events that can occur in a session

use crate::backend::BackendError;
use crate::message::Message;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Lifecycle
    InitRequested,
    Unmounted,

    // Initialization results
    HistoryLoaded {
        messages: Vec<Message>,
        bot_count: u64,
        user_count: u64,
    },
    HistoryFailed {
        error: BackendError,
    },

    // Bot reply cycle (shared by initialization and send)
    BotTypingStarted,
    BotReplied {
        message: Message,
    },
    BotReplyFailed {
        error: BackendError,
    },

    // Send cycle
    SendRequested {
        text: String,
    },
    UserMessagePosted {
        message: Message,
    },
    UserMessageFailed {
        error: BackendError,
    },

    // Input field
    DraftEdited {
        text: String,
    },
    DraftPasted {
        text: String,
    },
    DraftSubmitted,
}

impl Event {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Event::InitRequested => "init_requested",
            Event::Unmounted => "unmounted",
            Event::HistoryLoaded { .. } => "history_loaded",
            Event::HistoryFailed { .. } => "history_failed",
            Event::BotTypingStarted => "bot_typing_started",
            Event::BotReplied { .. } => "bot_replied",
            Event::BotReplyFailed { .. } => "bot_reply_failed",
            Event::SendRequested { .. } => "send_requested",
            Event::UserMessagePosted { .. } => "user_message_posted",
            Event::UserMessageFailed { .. } => "user_message_failed",
            Event::DraftEdited { .. } => "draft_edited",
            Event::DraftPasted { .. } => "draft_pasted",
            Event::DraftSubmitted => "draft_submitted",
        }
    }
}
