//! A terminal front end for chatting with an electronics assistant.
//!
//! The binary wires a Gemini provider into an
//! [`electrobot_core::ChatSession`] and draws the conversation with
//! [`TerminalRenderer`]. The pieces are exposed as a library so they can
//! be tested without a terminal.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod command;
mod config;
mod terminal;

pub use command::{HELP, Input};
pub use config::{Args, SYSTEM_PROMPT, load_credentials};
pub use terminal::TerminalRenderer;

/// Re-exports of [`electrobot_core`] crate.
pub mod core {
    pub use electrobot_core::*;
}
