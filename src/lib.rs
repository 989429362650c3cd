//! Chat session controller
//!
//! Client-side controller for a guided customer-support chat. A mounted
//! session loads its history from the chat service, asks for a bot reply
//! whenever one is owed, runs the send protocol for user messages and locks
//! input once the bot hands the conversation off to a human agent.
//!
//! The core is an Elm-style state machine ([`state_machine`]) driven by a
//! per-session tokio task ([`runtime`]) that talks to the service through
//! the [`backend::ChatBackend`] trait.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod backend;
pub mod completion;
pub mod config;
pub mod content;
pub mod input_gate;
pub mod message;
pub mod render;
pub mod runtime;
pub mod state_machine;

pub use backend::{BackendError, BackendErrorKind, ChatBackend, HttpChatBackend, LoggingBackend};
pub use config::{ClientConfig, ConfigError, RetryPolicy};
pub use input_gate::{Gate, LockReason};
pub use message::{Message, MessageId, Sender, SessionId};
pub use runtime::{mount, SessionClosed, SessionHandle, SessionView};
pub use state_machine::SessionNotice;
