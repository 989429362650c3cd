//! Chat backend abstraction
//!
//! The session runtime only talks to the backend through [`ChatBackend`],
//! which lets tests drive it with an in-memory fake.

mod error;
mod http;

pub use error::{BackendError, BackendErrorKind};
pub use http::HttpChatBackend;

use crate::message::{Message, Sender, SessionId};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// REST surface of the chat service
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// `POST /chat/new`
    async fn create_session(&self) -> Result<SessionId, BackendError>;

    /// `GET /chat/get-all-messages/{id}`, in insertion order
    async fn list_messages(&self, session_id: &SessionId) -> Result<Vec<Message>, BackendError>;

    /// `GET /chat/get-num-messages/{id}/{sender}`
    async fn count_messages(
        &self,
        session_id: &SessionId,
        sender: Sender,
    ) -> Result<u64, BackendError>;

    /// `POST /chat/{id}/new` with `sender: "user"`
    async fn post_user_message(
        &self,
        session_id: &SessionId,
        content: &str,
    ) -> Result<Message, BackendError>;

    /// `POST /chat/{id}/bot/new`
    async fn request_bot_reply(&self, session_id: &SessionId) -> Result<Message, BackendError>;
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for Arc<T> {
    async fn create_session(&self) -> Result<SessionId, BackendError> {
        (**self).create_session().await
    }

    async fn list_messages(&self, session_id: &SessionId) -> Result<Vec<Message>, BackendError> {
        (**self).list_messages(session_id).await
    }

    async fn count_messages(
        &self,
        session_id: &SessionId,
        sender: Sender,
    ) -> Result<u64, BackendError> {
        (**self).count_messages(session_id, sender).await
    }

    async fn post_user_message(
        &self,
        session_id: &SessionId,
        content: &str,
    ) -> Result<Message, BackendError> {
        (**self).post_user_message(session_id, content).await
    }

    async fn request_bot_reply(&self, session_id: &SessionId) -> Result<Message, BackendError> {
        (**self).request_bot_reply(session_id).await
    }
}

/// Logging wrapper for chat backends
pub struct LoggingBackend {
    inner: Arc<dyn ChatBackend>,
}

impl LoggingBackend {
    pub fn new(inner: Arc<dyn ChatBackend>) -> Self {
        Self { inner }
    }

    fn record<T>(
        operation: &str,
        session_id: Option<&SessionId>,
        start: Instant,
        result: &Result<T, BackendError>,
    ) {
        let duration = start.elapsed();
        let session = session_id.map_or("-", SessionId::as_str);
        match result {
            Ok(_) => {
                tracing::debug!(
                    operation,
                    session_id = %session,
                    duration_ms = %duration.as_millis(),
                    "Chat backend request completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    operation,
                    session_id = %session,
                    duration_ms = %duration.as_millis(),
                    kind = %e.kind,
                    status = ?e.status,
                    error = %e.message,
                    "Chat backend request failed"
                );
            }
        }
    }
}

#[async_trait]
impl ChatBackend for LoggingBackend {
    async fn create_session(&self) -> Result<SessionId, BackendError> {
        let start = Instant::now();
        let result = self.inner.create_session().await;
        Self::record("create_session", result.as_ref().ok(), start, &result);
        result
    }

    async fn list_messages(&self, session_id: &SessionId) -> Result<Vec<Message>, BackendError> {
        let start = Instant::now();
        let result = self.inner.list_messages(session_id).await;
        Self::record("list_messages", Some(session_id), start, &result);
        result
    }

    async fn count_messages(
        &self,
        session_id: &SessionId,
        sender: Sender,
    ) -> Result<u64, BackendError> {
        let start = Instant::now();
        let result = self.inner.count_messages(session_id, sender).await;
        let operation = match sender {
            Sender::User => "count_user_messages",
            Sender::Bot => "count_bot_messages",
        };
        Self::record(operation, Some(session_id), start, &result);
        result
    }

    async fn post_user_message(
        &self,
        session_id: &SessionId,
        content: &str,
    ) -> Result<Message, BackendError> {
        let start = Instant::now();
        let result = self.inner.post_user_message(session_id, content).await;
        Self::record("post_user_message", Some(session_id), start, &result);
        result
    }

    async fn request_bot_reply(&self, session_id: &SessionId) -> Result<Message, BackendError> {
        let start = Instant::now();
        let result = self.inner.request_bot_reply(session_id).await;
        Self::record("request_bot_reply", Some(session_id), start, &result);
        result
    }
}
