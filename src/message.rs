//! Session and message records exchanged with the chat backend

use crate::content;
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Identifiers arrive as JSON numbers from the reference backend but are
/// opaque to the client, so both numbers and strings are accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum OpaqueId {
    Number(i64),
    Text(String),
}

fn opaque_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match OpaqueId::deserialize(deserializer)? {
        OpaqueId::Number(n) => n.to_string(),
        OpaqueId::Text(s) => s,
    })
}

/// Backend-assigned session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(#[serde(deserialize_with = "opaque_id")] String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend-assigned message identifier, unique within a session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(#[serde(deserialize_with = "opaque_id")] String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// Path segment used by the per-sender count endpoint
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored message as returned by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: MessageId,
    pub session_id: SessionId,
    pub sender: Sender,
    pub content: String,
}

impl Message {
    /// Text to show for this message.
    ///
    /// Bot content may be a JSON envelope; see [`content::display_text`].
    pub fn display_text(&self) -> Cow<'_, str> {
        content::display_text(self.sender, &self.content)
    }
}

/// Request body for posting a new message
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage<'a> {
    pub content: &'a str,
    pub sender: Sender,
}

impl<'a> NewMessage<'a> {
    pub fn user(content: &'a str) -> Self {
        Self {
            content,
            sender: Sender::User,
        }
    }
}
