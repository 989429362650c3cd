//! Session state types

use crate::completion;
use crate::message::Message;

/// Progress of the initialization protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStage {
    /// Message list and per-sender counts in flight
    Fetching,
    /// History applied, bot reply about to be requested
    ReplyOwed,
    /// Bot reply in flight (typing indicator shown)
    AwaitingReply,
}

/// Progress of the send protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStage {
    /// User message in flight
    PostingUserMessage,
    /// User message appended, bot reply about to be requested
    UserMessagePosted,
    /// Bot reply in flight (typing indicator shown)
    AwaitingReply,
}

/// What the session is doing right now.
///
/// At most one initialization or send cycle exists at a time; both live in
/// this single enum so they cannot overlap.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Activity {
    /// Mounted, initialization not started yet
    #[default]
    Mounted,

    Initializing {
        stage: InitStage,
    },

    /// Ready for user input
    Idle,

    Sending {
        /// Trimmed text being sent, restored to the draft on failure
        captured: String,
        stage: SendStage,
    },

    /// Controller torn down; nothing may be applied any more
    Unmounted,
}

/// Per-session conversation state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    /// Ordered history, append-only after initialization
    pub messages: Vec<Message>,
    pub activity: Activity,
    /// Text currently held by the input field
    pub draft: String,
    /// Latched handoff flag; see [`SessionState::is_complete`]
    handed_off: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the history wholesale (initialization only)
    pub(crate) fn load_history(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.refresh_completion();
    }

    /// Append one message and re-derive completion
    pub(crate) fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.refresh_completion();
    }

    fn refresh_completion(&mut self) {
        self.handed_off = self.handed_off || completion::is_complete(&self.messages);
    }

    /// The conversation has been handed to a human.
    ///
    /// Derived from the latest message whenever history changes, and never
    /// reverts once set for this controller.
    pub fn is_complete(&self) -> bool {
        self.handed_off
    }

    pub fn is_awaiting_response(&self) -> bool {
        matches!(
            self.activity,
            Activity::Mounted | Activity::Initializing { .. } | Activity::Sending { .. }
        )
    }

    pub fn is_bot_typing(&self) -> bool {
        matches!(
            self.activity,
            Activity::Initializing {
                stage: InitStage::AwaitingReply
            } | Activity::Sending {
                stage: SendStage::AwaitingReply,
                ..
            }
        )
    }

    pub fn is_unmounted(&self) -> bool {
        self.activity == Activity::Unmounted
    }
}
