//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::backend::BackendError;
use crate::completion::HANDOFF_PHRASES;
use crate::input_gate::Gate;
use crate::message::{Message, MessageId, Sender, SessionId};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_sender() -> impl Strategy<Value = Sender> {
    prop_oneof![Just(Sender::User), Just(Sender::Bot)]
}

fn arb_content() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-zA-Z ]{0,30}",
        1 => proptest::sample::select(HANDOFF_PHRASES).prop_map(|phrase| format!("Ok, {phrase}.")),
    ]
}

fn arb_message() -> impl Strategy<Value = Message> {
    ("[0-9]{1,4}", arb_sender(), arb_content()).prop_map(|(id, sender, content)| Message {
        message_id: MessageId::new(id),
        session_id: SessionId::new("1"),
        sender,
        content,
    })
}

fn arb_error() -> impl Strategy<Value = BackendError> {
    prop_oneof![
        Just(BackendError::network("reset")),
        Just(BackendError::timeout("slow")),
        Just(BackendError::connect("refused")),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::InitRequested),
        Just(Event::Unmounted),
        (proptest::collection::vec(arb_message(), 0..4), 0u64..4, 0u64..4).prop_map(
            |(messages, bot_count, user_count)| Event::HistoryLoaded {
                messages,
                bot_count,
                user_count,
            }
        ),
        arb_error().prop_map(|error| Event::HistoryFailed { error }),
        Just(Event::BotTypingStarted),
        arb_message().prop_map(|message| Event::BotReplied { message }),
        arb_error().prop_map(|error| Event::BotReplyFailed { error }),
        "[a-z ]{0,10}".prop_map(|text| Event::SendRequested { text }),
        arb_message().prop_map(|message| Event::UserMessagePosted { message }),
        arb_error().prop_map(|error| Event::UserMessageFailed { error }),
        "[a-z ]{0,10}".prop_map(|text| Event::DraftEdited { text }),
        "[a-z ]{0,10}".prop_map(|text| Event::DraftPasted { text }),
        Just(Event::DraftSubmitted),
    ]
}

fn arb_busy_activity() -> impl Strategy<Value = Activity> {
    prop_oneof![
        Just(Activity::Initializing {
            stage: InitStage::Fetching
        }),
        Just(Activity::Initializing {
            stage: InitStage::AwaitingReply
        }),
        "[a-z]{1,8}".prop_map(|captured| Activity::Sending {
            captured,
            stage: SendStage::PostingUserMessage,
        }),
        "[a-z]{1,8}".prop_map(|captured| Activity::Sending {
            captured,
            stage: SendStage::AwaitingReply,
        }),
    ]
}

/// Run a sequence of events, ignoring rejections, and collect every
/// successful transition.
fn run(events: Vec<Event>) -> Vec<(SessionState, TransitionResult)> {
    let mut state = SessionState::new();
    let mut steps = Vec::new();
    for event in events {
        if let Ok(result) = transition(&state, event) {
            let before = std::mem::replace(&mut state, result.new_state.clone());
            steps.push((before, result));
        }
    }
    steps
}

fn is_request(effect: &Effect) -> bool {
    matches!(
        effect,
        Effect::FetchHistory | Effect::PostUserMessage { .. } | Effect::RequestBotReply
    )
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// No transition ever starts more than one backend request
    #[test]
    fn prop_at_most_one_request_per_transition(
        events in proptest::collection::vec(arb_event(), 0..25)
    ) {
        for (_, result) in run(events) {
            let requests = result.effects.iter().filter(|e| is_request(e)).count();
            prop_assert!(requests <= 1, "Multiple requests: {:?}", result.effects);
        }
    }

    /// Once handed off, always handed off
    #[test]
    fn prop_completion_is_monotonic(events in proptest::collection::vec(arb_event(), 0..25)) {
        for (before, result) in run(events) {
            if before.is_complete() {
                prop_assert!(result.new_state.is_complete());
            }
        }
    }

    /// Messages are never removed after initialization
    #[test]
    fn prop_history_only_grows_after_init(events in proptest::collection::vec(arb_event(), 0..25)) {
        for (before, result) in run(events) {
            if matches!(before.activity, Activity::Initializing { stage: InitStage::Fetching }) {
                continue;
            }
            prop_assert!(result.new_state.messages.len() >= before.messages.len());
            prop_assert_eq!(
                &result.new_state.messages[..before.messages.len()],
                before.messages.as_slice()
            );
        }
    }

    /// Nothing is applied after unmount
    #[test]
    fn prop_unmounted_is_absorbing(event in arb_event()) {
        let mut state = SessionState::new();
        state.activity = Activity::Unmounted;
        prop_assert_eq!(transition(&state, event), Err(TransitionError::Unmounted));
    }

    /// A locked field rejects every input event
    #[test]
    fn prop_locked_gate_rejects_draft_events(
        activity in arb_busy_activity(),
        text in "[a-z]{1,10}",
    ) {
        let mut state = SessionState::new();
        state.activity = activity;
        let gate = Gate::for_state(&state);
        prop_assert!(gate.is_locked());

        for event in [
            Event::DraftEdited { text: text.clone() },
            Event::DraftPasted { text: text.clone() },
            Event::DraftSubmitted,
        ] {
            let result = transition(&state, event);
            prop_assert!(
                matches!(result, Err(TransitionError::InputLocked(_))),
                "Locked gate admitted input: {:?}",
                result
            );
        }
    }

    /// Busy sessions reject sends rather than queueing them
    #[test]
    fn prop_busy_rejects_sends(activity in arb_busy_activity(), text in "[a-z]{1,10}") {
        let mut state = SessionState::new();
        state.activity = activity;
        prop_assert_eq!(
            transition(&state, Event::SendRequested { text }),
            Err(TransitionError::Busy)
        );
    }

    /// Idle sessions accept any non-blank send
    #[test]
    fn prop_idle_accepts_sends(text in "[a-zA-Z ]{0,5}[a-zA-Z][a-zA-Z ]{0,5}") {
        let mut state = SessionState::new();
        state.activity = Activity::Idle;

        let result = transition(&state, Event::SendRequested { text: text.clone() });
        prop_assert!(result.is_ok(), "Idle should accept sends: {:?}", result);
        if let Ok(result) = result {
            prop_assert_eq!(
                result.effects,
                vec![Effect::PostUserMessage { content: text.trim().to_string() }]
            );
            prop_assert!(Gate::for_state(&result.new_state).is_locked());
        }
    }
}
