//! reqwest implementation of the chat backend

use super::{BackendError, BackendErrorKind, ChatBackend};
use crate::config::{ClientConfig, RetryPolicy};
use crate::message::{Message, NewMessage, Sender, SessionId};
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;

/// Chat backend reached over HTTP
pub struct HttpChatBackend {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl HttpChatBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BackendError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            retry: config.retry,
        })
    }

    /// Append percent-encoded path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                BackendError::unknown(format!("Base URL cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, retrying per the configured policy.
    ///
    /// GETs are retried on any retryable error. Other methods are only
    /// retried when the connection was never established, since the server
    /// may otherwise have applied the request already.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&NewMessage<'_>>,
    ) -> Result<T, BackendError> {
        let idempotent = method == Method::GET;
        let mut retry = 0;

        loop {
            match self.send_once(method.clone(), url.clone(), body).await {
                Ok(value) => return Ok(value),
                Err(e) if retry < self.retry.max_retries && should_retry(&e, idempotent) => {
                    retry += 1;
                    let delay = self.retry.delay_for(retry);
                    tracing::debug!(
                        %method,
                        url = %url,
                        retry,
                        delay_ms = %delay.as_millis(),
                        error = %e,
                        "Retrying chat backend request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&NewMessage<'_>>,
    ) -> Result<T, BackendError> {
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::from_transport(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::from_transport(&e))?;

        if !status.is_success() {
            return Err(BackendError::from_status(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            BackendError::malformed(format!("Failed to parse response: {e} - body: {text}"))
                .with_status(status.as_u16())
        })
    }
}

fn should_retry(err: &BackendError, idempotent: bool) -> bool {
    if idempotent {
        err.is_retryable()
    } else {
        err.kind == BackendErrorKind::Connect
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn create_session(&self) -> Result<SessionId, BackendError> {
        let url = self.endpoint(&["chat", "new"])?;
        self.send(Method::POST, url, None).await
    }

    async fn list_messages(&self, session_id: &SessionId) -> Result<Vec<Message>, BackendError> {
        let url = self.endpoint(&["chat", "get-all-messages", session_id.as_str()])?;
        self.send(Method::GET, url, None).await
    }

    async fn count_messages(
        &self,
        session_id: &SessionId,
        sender: Sender,
    ) -> Result<u64, BackendError> {
        let url = self.endpoint(&[
            "chat",
            "get-num-messages",
            session_id.as_str(),
            sender.as_str(),
        ])?;
        self.send(Method::GET, url, None).await
    }

    async fn post_user_message(
        &self,
        session_id: &SessionId,
        content: &str,
    ) -> Result<Message, BackendError> {
        let url = self.endpoint(&["chat", session_id.as_str(), "new"])?;
        let body = NewMessage::user(content);
        self.send(Method::POST, url, Some(&body)).await
    }

    async fn request_bot_reply(&self, session_id: &SessionId) -> Result<Message, BackendError> {
        let url = self.endpoint(&["chat", session_id.as_str(), "bot", "new"])?;
        self.send(Method::POST, url, None).await
    }
}
