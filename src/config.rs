//! Client configuration

use reqwest::Url;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {value:?} ({reason})")]
    InvalidUrl {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based): base, 2x base, 4x base...
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }
}

/// Configuration for talking to the chat backend
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Read configuration from `CHAT_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = match lookup("CHAT_API_BASE_URL") {
            Some(value) => Url::parse(&value).map_err(|e| ConfigError::InvalidUrl {
                var: "CHAT_API_BASE_URL",
                value: value.clone(),
                reason: e.to_string(),
            })?,
            None => Url::parse(DEFAULT_BASE_URL).map_err(|e| ConfigError::InvalidUrl {
                var: "CHAT_API_BASE_URL",
                value: DEFAULT_BASE_URL.to_string(),
                reason: e.to_string(),
            })?,
        };

        let request_timeout = match parse_number(&lookup, "CHAT_REQUEST_TIMEOUT_SECS")? {
            // A zero timeout would fail every request
            Some(0) => {
                return Err(ConfigError::InvalidNumber {
                    var: "CHAT_REQUEST_TIMEOUT_SECS",
                    value: "0".to_string(),
                })
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let max_retries = match parse_number(&lookup, "CHAT_MAX_RETRIES")? {
            Some(n) => u32::try_from(n).map_err(|_| ConfigError::InvalidNumber {
                var: "CHAT_MAX_RETRIES",
                value: n.to_string(),
            })?,
            None => DEFAULT_MAX_RETRIES,
        };

        let base_delay = parse_number(&lookup, "CHAT_RETRY_BASE_DELAY_MS")?
            .map_or(DEFAULT_RETRY_BASE_DELAY, Duration::from_millis);

        Ok(Self {
            base_url,
            request_timeout,
            retry: RetryPolicy {
                max_retries,
                base_delay,
            },
        })
    }
}

fn parse_number(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { var, value })
        })
        .transpose()
}
