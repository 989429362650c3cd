//! Pure state transition function
//!
//! Given the same state and event this always produces the same result and
//! performs no I/O; the runtime executes the returned effects.

use super::state::{Activity, InitStage, SendStage};
use super::{Effect, Event, SessionNotice, SessionState};
use crate::input_gate::{Gate, LockReason};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Reasons an event is rejected. The runtime treats every rejection as a
/// no-op.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error("A request is already in flight for this session")]
    Busy,
    #[error("Conversation has been handed off to an agent")]
    HandedOff,
    #[error("Input is locked: {0:?}")]
    InputLocked(LockReason),
    #[error("Initialization already in progress")]
    InitInProgress,
    #[error("Session already initialized")]
    AlreadyInitialized,
    #[error("Session has been unmounted")]
    Unmounted,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// A bot reply is owed when the counts are level: the last user message is
/// unanswered, or the session is brand new and needs its greeting.
pub fn reply_owed(bot_count: u64, user_count: u64) -> bool {
    bot_count == user_count
}

/// Well-formed sessions either owe a reply or have exactly one more bot
/// message than user messages (the greeting).
fn counts_well_formed(bot_count: u64, user_count: u64) -> bool {
    bot_count == user_count || bot_count == user_count.saturating_add(1)
}

pub fn transition(state: &SessionState, event: Event) -> Result<TransitionResult, TransitionError> {
    if state.is_unmounted() {
        return Err(TransitionError::Unmounted);
    }

    match (&state.activity, event) {
        // ============================================================
        // Lifecycle
        // ============================================================
        (_, Event::Unmounted) => Ok(TransitionResult::new(with_activity(
            state,
            Activity::Unmounted,
        ))),

        (Activity::Mounted, Event::InitRequested) => Ok(TransitionResult::new(with_activity(
            state,
            Activity::Initializing {
                stage: InitStage::Fetching,
            },
        ))
        .with_effect(Effect::FetchHistory)),

        (Activity::Initializing { .. }, Event::InitRequested) => {
            Err(TransitionError::InitInProgress)
        }

        (_, Event::InitRequested) => Err(TransitionError::AlreadyInitialized),

        // ============================================================
        // Initialization
        // ============================================================
        (
            Activity::Initializing {
                stage: InitStage::Fetching,
            },
            Event::HistoryLoaded {
                messages,
                bot_count,
                user_count,
            },
        ) => {
            let mut next = state.clone();
            next.load_history(messages);

            let anomaly = (!counts_well_formed(bot_count, user_count)).then_some(
                Effect::ReportCountAnomaly {
                    bot_count,
                    user_count,
                },
            );

            if reply_owed(bot_count, user_count) {
                next.activity = Activity::Initializing {
                    stage: InitStage::ReplyOwed,
                };
                Ok(TransitionResult::new(next)
                    .with_effects(anomaly)
                    .with_effect(Effect::RequestBotReply))
            } else {
                next.activity = Activity::Idle;
                Ok(TransitionResult::new(next).with_effects(anomaly))
            }
        }

        (
            Activity::Initializing {
                stage: InitStage::Fetching,
            },
            Event::HistoryFailed { error },
        ) => Ok(
            TransitionResult::new(with_activity(state, Activity::Idle)).with_effect(
                Effect::Notify(SessionNotice::history_unavailable(&error)),
            ),
        ),

        // ============================================================
        // Bot reply cycle
        // ============================================================
        (
            Activity::Initializing {
                stage: InitStage::ReplyOwed,
            },
            Event::BotTypingStarted,
        ) => Ok(TransitionResult::new(with_activity(
            state,
            Activity::Initializing {
                stage: InitStage::AwaitingReply,
            },
        ))),

        (
            Activity::Sending {
                captured,
                stage: SendStage::UserMessagePosted,
            },
            Event::BotTypingStarted,
        ) => {
            let activity = Activity::Sending {
                captured: captured.clone(),
                stage: SendStage::AwaitingReply,
            };
            Ok(TransitionResult::new(with_activity(state, activity)))
        }

        (
            Activity::Initializing {
                stage: InitStage::ReplyOwed | InitStage::AwaitingReply,
            }
            | Activity::Sending {
                stage: SendStage::UserMessagePosted | SendStage::AwaitingReply,
                ..
            },
            Event::BotReplied { message },
        ) => {
            let mut next = with_activity(state, Activity::Idle);
            next.append(message);
            Ok(TransitionResult::new(next))
        }

        (
            Activity::Initializing {
                stage: InitStage::ReplyOwed | InitStage::AwaitingReply,
            },
            Event::BotReplyFailed { error },
        ) => Ok(
            TransitionResult::new(with_activity(state, Activity::Idle)).with_effect(
                Effect::Notify(SessionNotice::greeting_unavailable(&error)),
            ),
        ),

        (
            Activity::Sending {
                captured,
                stage: SendStage::UserMessagePosted | SendStage::AwaitingReply,
            },
            Event::BotReplyFailed { error },
        ) => Ok(send_failed(state, captured, &error)),

        // ============================================================
        // Send cycle
        // ============================================================
        (_, Event::SendRequested { text }) => begin_send(state, &text),

        (
            Activity::Sending {
                captured,
                stage: SendStage::PostingUserMessage,
            },
            Event::UserMessagePosted { message },
        ) => {
            let mut next = with_activity(
                state,
                Activity::Sending {
                    captured: captured.clone(),
                    stage: SendStage::UserMessagePosted,
                },
            );
            next.append(message);
            Ok(TransitionResult::new(next).with_effect(Effect::RequestBotReply))
        }

        (
            Activity::Sending {
                captured,
                stage: SendStage::PostingUserMessage,
            },
            Event::UserMessageFailed { error },
        ) => Ok(send_failed(state, captured, &error)),

        // ============================================================
        // Input field
        // ============================================================
        (_, Event::DraftEdited { text }) => {
            ensure_open(state)?;
            let mut next = state.clone();
            next.draft = text;
            Ok(TransitionResult::new(next))
        }

        (_, Event::DraftPasted { text }) => {
            ensure_open(state)?;
            let mut next = state.clone();
            next.draft.push_str(&text);
            Ok(TransitionResult::new(next))
        }

        (_, Event::DraftSubmitted) => {
            ensure_open(state)?;
            begin_send(state, &state.draft)
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (activity, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {activity:?} with event {}",
            event.name()
        ))),
    }
}

// Helper functions

fn with_activity(state: &SessionState, activity: Activity) -> SessionState {
    let mut next = state.clone();
    next.activity = activity;
    next
}

fn ensure_open(state: &SessionState) -> Result<(), TransitionError> {
    match Gate::for_state(state) {
        Gate::Open => Ok(()),
        Gate::Locked(reason) => Err(TransitionError::InputLocked(reason)),
    }
}

fn begin_send(state: &SessionState, text: &str) -> Result<TransitionResult, TransitionError> {
    let content = text.trim();
    if content.is_empty() {
        return Err(TransitionError::EmptyMessage);
    }
    if state.activity != Activity::Idle {
        return Err(TransitionError::Busy);
    }
    if state.is_complete() {
        return Err(TransitionError::HandedOff);
    }

    let mut next = with_activity(
        state,
        Activity::Sending {
            captured: content.to_string(),
            stage: SendStage::PostingUserMessage,
        },
    );
    next.draft.clear();

    Ok(TransitionResult::new(next).with_effect(Effect::PostUserMessage {
        content: content.to_string(),
    }))
}

fn send_failed(
    state: &SessionState,
    captured: &str,
    error: &crate::backend::BackendError,
) -> TransitionResult {
    let mut next = with_activity(state, Activity::Idle);
    next.draft = captured.to_string();
    TransitionResult::new(next).with_effect(Effect::Notify(SessionNotice::send_failed(error)))
}
