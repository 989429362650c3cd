//! Bot message content decoding
//!
//! The bot stores replies either as a JSON envelope
//! (`{"content": "...", "valid": true, "extracted": "..."}`) or, for older
//! rows, as plain text. Decoding never fails: anything that is not an
//! envelope with a usable `content` field is treated as raw text.

use crate::message::Sender;
use serde_json::Value;
use std::borrow::Cow;

/// Decoded bot content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotContent {
    /// Plain text, or JSON without a usable `content` field
    Raw(String),
    /// Structured reply with optional validation metadata
    Envelope {
        content: String,
        valid: Option<bool>,
        extracted: Option<String>,
    },
}

impl BotContent {
    pub fn decode(raw: &str) -> Self {
        let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(raw) else {
            return BotContent::Raw(raw.to_string());
        };

        let content = match fields.get("content") {
            None | Some(Value::Null) => return BotContent::Raw(raw.to_string()),
            Some(Value::String(text)) => text.clone(),
            // Non-string payloads are shown in their JSON form
            Some(other) => other.to_string(),
        };

        BotContent::Envelope {
            content,
            valid: fields.get("valid").and_then(Value::as_bool),
            extracted: fields
                .get("extracted")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// The text a reader should see
    pub fn into_text(self) -> String {
        match self {
            BotContent::Raw(text) | BotContent::Envelope { content: text, .. } => text,
        }
    }

    pub fn is_envelope(&self) -> bool {
        matches!(self, BotContent::Envelope { .. })
    }
}

/// Extract displayable text for a stored message.
///
/// User content is always shown verbatim; only bot content is decoded.
pub fn display_text(sender: Sender, raw: &str) -> Cow<'_, str> {
    match sender {
        Sender::User => Cow::Borrowed(raw),
        Sender::Bot => match BotContent::decode(raw) {
            BotContent::Raw(_) => Cow::Borrowed(raw),
            envelope => Cow::Owned(envelope.into_text()),
        },
    }
}
