//! Effects produced by state transitions

use crate::backend::{BackendError, BackendErrorKind};

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the message list and both per-sender counts concurrently
    FetchHistory,

    /// Post the user's message
    PostUserMessage { content: String },

    /// Ask the backend for the next bot message
    RequestBotReply,

    /// Counts did not match any well-formed turn shape
    ReportCountAnomaly { bot_count: u64, user_count: u64 },

    /// Tell the surrounding UI about a failure
    Notify(SessionNotice),
}

/// User-facing notices published by a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// History could not be loaded; the session stays empty
    HistoryUnavailable { message: String },
    /// The owed bot reply could not be fetched during initialization
    GreetingUnavailable { message: String },
    /// A send failed and the draft was restored
    SendFailed { message: String },
}

impl SessionNotice {
    pub fn history_unavailable(error: &BackendError) -> Self {
        SessionNotice::HistoryUnavailable {
            message: describe(error, "Could not load this conversation."),
        }
    }

    pub fn greeting_unavailable(error: &BackendError) -> Self {
        SessionNotice::GreetingUnavailable {
            message: describe(error, "The assistant did not respond."),
        }
    }

    pub fn send_failed(error: &BackendError) -> Self {
        SessionNotice::SendFailed {
            message: describe(error, "Failed to send message. Please try again."),
        }
    }

    /// Blocking notices need acknowledgement before the user continues
    pub fn is_blocking(&self) -> bool {
        matches!(self, SessionNotice::SendFailed { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            SessionNotice::HistoryUnavailable { message }
            | SessionNotice::GreetingUnavailable { message }
            | SessionNotice::SendFailed { message } => message,
        }
    }
}

fn describe(error: &BackendError, fallback: &str) -> String {
    match error.kind {
        BackendErrorKind::Timeout => {
            "The chat service took too long to respond. Please try again.".to_string()
        }
        _ => fallback.to_string(),
    }
}
