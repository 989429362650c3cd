//! Input gating
//!
//! Derives a single open/locked signal from session state and everything the
//! text field needs from it: displayed value, placeholder, focus requests and
//! whether input events are admitted.

use crate::state_machine::SessionState;

pub const PLACEHOLDER_OPEN: &str = "Type a message...";
pub const PLACEHOLDER_WAITING: &str = "Waiting for response...";
pub const PLACEHOLDER_HANDED_OFF: &str = "This conversation has been handed off to an agent.";

/// Why input is locked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReason {
    AwaitingResponse,
    BotTyping,
    /// Terminal for the session
    HandedOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Open,
    Locked(LockReason),
}

impl Gate {
    pub fn for_state(state: &SessionState) -> Self {
        if state.is_complete() {
            Gate::Locked(LockReason::HandedOff)
        } else if state.is_bot_typing() {
            Gate::Locked(LockReason::BotTyping)
        } else if state.is_awaiting_response() {
            Gate::Locked(LockReason::AwaitingResponse)
        } else {
            Gate::Open
        }
    }

    pub fn is_locked(self) -> bool {
        matches!(self, Gate::Locked(_))
    }

    /// No way back to `Open` exists from here
    pub fn is_terminal(self) -> bool {
        self == Gate::Locked(LockReason::HandedOff)
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Gate::Open => PLACEHOLDER_OPEN,
            Gate::Locked(LockReason::HandedOff) => PLACEHOLDER_HANDED_OFF,
            Gate::Locked(_) => PLACEHOLDER_WAITING,
        }
    }

    /// What the field shows. Locked fields show nothing; the draft itself is
    /// kept.
    pub fn display_value(self, draft: &str) -> &str {
        match self {
            Gate::Open => draft,
            Gate::Locked(_) => "",
        }
    }

    pub fn send_enabled(self, draft: &str) -> bool {
        self == Gate::Open && !draft.trim().is_empty()
    }
}

/// Edge between two consecutive gate values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateChange {
    Unchanged,
    /// Open -> Locked
    Locked,
    /// Locked -> Open; the field should regain focus
    Unlocked,
}

impl GateChange {
    pub fn between(before: Gate, after: Gate) -> Self {
        match (before.is_locked(), after.is_locked()) {
            (false, true) => GateChange::Locked,
            (true, false) => GateChange::Unlocked,
            _ => GateChange::Unchanged,
        }
    }
}
