//! Session runtime
//!
//! One tokio task per mounted session owns the [`SessionState`] and is the
//! only consumer of its event channel. Backend calls run as child tasks that
//! report back through the same channel, so a command arriving mid-cycle is
//! seen (and rejected) by the state machine rather than queued behind it.

mod executor;


use executor::SessionRuntime;

use crate::backend::ChatBackend;
use crate::input_gate::Gate;
use crate::message::{Message, SessionId};
use crate::render::{self, Row};
use crate::state_machine::{Event, SessionNotice, SessionState};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const EVENT_CHANNEL_CAPACITY: usize = 32;
const NOTICE_CHANNEL_CAPACITY: usize = 16;

/// Everything a front end needs to draw a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub session_id: SessionId,
    pub messages: Vec<Message>,
    pub rows: Vec<Row>,
    pub gate: Gate,
    pub locked: bool,
    pub placeholder: &'static str,
    /// What the input field shows (empty while locked)
    pub input_value: String,
    pub send_enabled: bool,
    pub bot_typing: bool,
    pub awaiting_response: bool,
    pub complete: bool,
    /// Incremented each time the field unlocks and should take focus
    pub focus_requests: u64,
    pub unmounted: bool,
}

impl SessionView {
    pub fn from_state(session_id: &SessionId, state: &SessionState, focus_requests: u64) -> Self {
        let gate = Gate::for_state(state);
        let bot_typing = state.is_bot_typing();
        Self {
            session_id: session_id.clone(),
            messages: state.messages.clone(),
            rows: render::render(&state.messages, bot_typing),
            gate,
            locked: gate.is_locked(),
            placeholder: gate.placeholder(),
            input_value: gate.display_value(&state.draft).to_string(),
            send_enabled: gate.send_enabled(&state.draft),
            bot_typing,
            awaiting_response: state.is_awaiting_response(),
            complete: state.is_complete(),
            focus_requests,
            unmounted: state.is_unmounted(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Session {0} is no longer mounted")]
pub struct SessionClosed(pub SessionId);

/// Handle to a mounted session. Dropping it unmounts the session.
pub struct SessionHandle {
    session_id: SessionId,
    event_tx: mpsc::Sender<Event>,
    view_rx: watch::Receiver<SessionView>,
    notice_rx: broadcast::Receiver<SessionNotice>,
    liveness: CancellationToken,
    task: Option<JoinHandle<()>>,
}

/// Mount a session: spawn its runtime task and start initialization.
pub fn mount<B: ChatBackend + 'static>(session_id: SessionId, backend: B) -> SessionHandle {
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let state = SessionState::new();
    let (view_tx, view_rx) = watch::channel(SessionView::from_state(&session_id, &state, 0));
    // Subscribe before spawning so no notice can be missed
    let (notice_tx, notice_rx) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
    let liveness = CancellationToken::new();

    let runtime = SessionRuntime::new(
        session_id.clone(),
        state,
        Arc::new(backend),
        event_rx,
        event_tx.clone(),
        view_tx,
        notice_tx,
        liveness.clone(),
    );
    let task = tokio::spawn(runtime.run());

    SessionHandle {
        session_id,
        event_tx,
        view_rx,
        notice_rx,
        liveness,
        task: Some(task),
    }
}

impl SessionHandle {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Send `text` as a user message. Blank text, a busy session or a
    /// handed-off conversation make this a no-op.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.dispatch(Event::SendRequested { text: text.into() })
            .await
    }

    /// Replace the draft. Ignored while input is locked.
    pub async fn edit_draft(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.dispatch(Event::DraftEdited { text: text.into() }).await
    }

    /// Append pasted text to the draft. Ignored while input is locked.
    pub async fn paste(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.dispatch(Event::DraftPasted { text: text.into() }).await
    }

    /// Send the current draft (Enter key)
    pub async fn submit(&self) -> Result<(), SessionClosed> {
        self.dispatch(Event::DraftSubmitted).await
    }

    pub fn view(&self) -> SessionView {
        self.view_rx.borrow().clone()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<SessionView> {
        self.view_rx.clone()
    }

    /// Notices published since mount, in order
    pub fn notices(&mut self) -> &mut broadcast::Receiver<SessionNotice> {
        &mut self.notice_rx
    }

    /// Wait until the view satisfies `predicate`
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&SessionView) -> bool,
    ) -> Result<SessionView, SessionClosed> {
        let mut rx = self.view_rx.clone();
        let view = rx
            .wait_for(predicate)
            .await
            .map_err(|_| SessionClosed(self.session_id.clone()))?;
        Ok(view.clone())
    }

    /// Tear the session down and wait for its task to finish
    pub async fn unmount(mut self) {
        self.liveness.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(session_id = %self.session_id, error = %e, "Session task failed");
            }
        }
    }

    async fn dispatch(&self, event: Event) -> Result<(), SessionClosed> {
        if self.liveness.is_cancelled() {
            return Err(SessionClosed(self.session_id.clone()));
        }
        self.event_tx
            .send(event)
            .await
            .map_err(|_| SessionClosed(self.session_id.clone()))
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.liveness.cancel();
    }
}
