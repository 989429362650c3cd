//! Session runtime executor

use super::SessionView;
use crate::backend::ChatBackend;
use crate::input_gate::{Gate, GateChange};
use crate::message::{Sender, SessionId};
use crate::state_machine::{transition, Effect, Event, SessionNotice, SessionState};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Owns one session's state and executes its effects
pub(super) struct SessionRuntime<B: ChatBackend + 'static> {
    session_id: SessionId,
    state: SessionState,
    backend: Arc<B>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    view_tx: watch::Sender<SessionView>,
    notice_tx: broadcast::Sender<SessionNotice>,
    /// Cancelled on unmount; nothing is applied afterwards
    liveness: CancellationToken,
    focus_requests: u64,
}

impl<B: ChatBackend + 'static> SessionRuntime<B> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        session_id: SessionId,
        state: SessionState,
        backend: Arc<B>,
        event_rx: mpsc::Receiver<Event>,
        event_tx: mpsc::Sender<Event>,
        view_tx: watch::Sender<SessionView>,
        notice_tx: broadcast::Sender<SessionNotice>,
        liveness: CancellationToken,
    ) -> Self {
        Self {
            session_id,
            state,
            backend,
            event_rx,
            event_tx,
            view_tx,
            notice_tx,
            liveness,
            focus_requests: 0,
        }
    }

    pub(super) async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, "Mounting session");

        if !self.liveness.is_cancelled() {
            self.process_event(Event::InitRequested);
        }

        loop {
            tokio::select! {
                biased;

                () = self.liveness.cancelled() => break,

                Some(event) = self.event_rx.recv() => {
                    self.process_event(event);
                }

                else => break,
            }
        }

        self.apply(Event::Unmounted);
        self.publish();
        tracing::info!(session_id = %self.session_id, "Session unmounted");
    }

    /// Apply an event and everything it generates, publishing the view after
    /// each step so intermediate states (user message before typing
    /// indicator) are observable.
    fn process_event(&mut self, event: Event) {
        let mut events_to_process = VecDeque::from([event]);

        while let Some(current_event) = events_to_process.pop_front() {
            if self.liveness.is_cancelled() {
                tracing::debug!(
                    session_id = %self.session_id,
                    event = current_event.name(),
                    "Dropping event after unmount"
                );
                return;
            }

            let Some(effects) = self.apply(current_event) else {
                continue;
            };

            for effect in effects {
                if let Some(generated_event) = self.execute_effect(effect) {
                    events_to_process.push_back(generated_event);
                }
            }

            self.publish();
        }
    }

    /// Run the pure transition and swap in the new state. Rejected events
    /// leave the state untouched.
    fn apply(&mut self, event: Event) -> Option<Vec<Effect>> {
        let name = event.name();
        let result = match transition(&self.state, event) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(
                    session_id = %self.session_id,
                    event = name,
                    reason = %e,
                    "Event rejected"
                );
                return None;
            }
        };

        let before = Gate::for_state(&self.state);
        self.state = result.new_state;
        let after = Gate::for_state(&self.state);

        match GateChange::between(before, after) {
            GateChange::Unlocked => self.focus_requests += 1,
            GateChange::Locked | GateChange::Unchanged => {}
        }
        if after.is_terminal() && !before.is_terminal() {
            tracing::info!(session_id = %self.session_id, "Conversation handed off to an agent");
        }

        tracing::debug!(
            session_id = %self.session_id,
            event = name,
            activity = ?self.state.activity,
            "Transition applied"
        );
        Some(result.effects)
    }

    fn publish(&self) {
        let view = SessionView::from_state(&self.session_id, &self.state, self.focus_requests);
        self.view_tx.send_replace(view);
    }

    fn execute_effect(&self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::FetchHistory => {
                let backend = Arc::clone(&self.backend);
                let session_id = self.session_id.clone();
                self.spawn_cancellable_request(async move {
                    let fetched = futures::try_join!(
                        backend.list_messages(&session_id),
                        backend.count_messages(&session_id, Sender::Bot),
                        backend.count_messages(&session_id, Sender::User),
                    );
                    match fetched {
                        Ok((messages, bot_count, user_count)) => Event::HistoryLoaded {
                            messages,
                            bot_count,
                            user_count,
                        },
                        Err(error) => Event::HistoryFailed { error },
                    }
                });
                None
            }

            Effect::PostUserMessage { content } => {
                let backend = Arc::clone(&self.backend);
                let session_id = self.session_id.clone();
                self.spawn_request(async move {
                    match backend.post_user_message(&session_id, &content).await {
                        Ok(message) => Event::UserMessagePosted { message },
                        Err(error) => Event::UserMessageFailed { error },
                    }
                });
                None
            }

            Effect::RequestBotReply => {
                let backend = Arc::clone(&self.backend);
                let session_id = self.session_id.clone();
                self.spawn_request(async move {
                    match backend.request_bot_reply(&session_id).await {
                        Ok(message) => Event::BotReplied { message },
                        Err(error) => Event::BotReplyFailed { error },
                    }
                });
                // Typing indicator shows as soon as the request is out
                Some(Event::BotTypingStarted)
            }

            Effect::ReportCountAnomaly {
                bot_count,
                user_count,
            } => {
                tracing::warn!(
                    session_id = %self.session_id,
                    bot_count,
                    user_count,
                    "Unexpected message counts; not requesting a bot reply"
                );
                None
            }

            Effect::Notify(notice) => {
                if notice.is_blocking() {
                    tracing::error!(session_id = %self.session_id, notice = ?notice, "Send failed");
                } else {
                    tracing::warn!(session_id = %self.session_id, notice = ?notice, "Session degraded");
                }
                // No subscribers is fine
                let _ = self.notice_tx.send(notice);
                None
            }
        }
    }

    /// Run a backend request in the background and feed its result back as an
    /// event. The request always runs to completion so the server applies
    /// it; after unmount the loop is gone and the result is discarded.
    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        let event_tx = self.event_tx.clone();
        let session_id = self.session_id.clone();

        tokio::spawn(async move {
            let event = request.await;
            if event_tx.send(event).await.is_err() {
                tracing::debug!(session_id = %session_id, "Discarding result after unmount");
            }
        });
    }

    /// Like [`Self::spawn_request`], but abandons the request on unmount.
    /// Only for reads that change nothing on the server.
    fn spawn_cancellable_request<F>(&self, request: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        let event_tx = self.event_tx.clone();
        let liveness = self.liveness.clone();
        let session_id = self.session_id.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;

                () = liveness.cancelled() => {
                    tracing::debug!(session_id = %session_id, "Request abandoned after unmount");
                }

                event = request => {
                    let _ = event_tx.send(event).await;
                }
            }
        });
    }
}
