//! Session state machine
//!
//! Elm-style: a pure transition function maps (state, event) to a new state
//! plus effects, and the runtime performs the effects.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, SessionNotice};
pub use event::Event;
pub use state::{Activity, InitStage, SendStage, SessionState};
pub use transition::{reply_owed, transition, TransitionError, TransitionResult};
