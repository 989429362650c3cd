//! Backend error types

use std::fmt;
use thiserror::Error;

/// Chat backend error with classification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
    /// HTTP status, when the backend answered at all
    pub status: Option<u16>,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Connect, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Timeout, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::MalformedResponse, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Unknown, message)
    }

    /// Classify a transport-level failure
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("Request timed out: {err}"))
        } else if err.is_connect() {
            Self::connect(format!("Connection failed: {err}"))
        } else {
            Self::network(format!("Request failed: {err}"))
        }
    }

    /// Classify a non-success HTTP response
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let kind = match status.as_u16() {
            404 => BackendErrorKind::NotFound,
            429 => BackendErrorKind::RateLimit,
            400..=499 => BackendErrorKind::InvalidRequest,
            500..=599 => BackendErrorKind::ServerError,
            _ => BackendErrorKind::Unknown,
        };
        Self::new(kind, format!("HTTP {status}: {body}")).with_status(status.as_u16())
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Error classification for retry logic and user messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendErrorKind {
    /// Connection could not be established; the request never left
    Connect,
    /// Other transport failures
    Network,
    /// No response within the configured timeout
    Timeout,
    /// Rate limited (429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Unknown session or route (404)
    NotFound,
    /// Other 4xx
    InvalidRequest,
    /// Success status but an undecodable body
    MalformedResponse,
    Unknown,
}

impl BackendErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Connect | Self::Network | Self::Timeout | Self::RateLimit | Self::ServerError
        )
    }
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::RateLimit => "rate_limit",
            Self::ServerError => "server_error",
            Self::NotFound => "not_found",
            Self::InvalidRequest => "invalid_request",
            Self::MalformedResponse => "malformed_response",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
