//! Core logic of the chat: the transcript, the streaming completion client,
//! and the per-turn session driver.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod completion;
mod error;
pub mod render;
mod session;
pub mod transcript;

pub use completion::{CompletionClient, CompletionStream};
pub use error::{ChatError, CompletionError};
pub use session::{ChatSession, ChatSessionBuilder};

/// Re-exports of the protocol types callers need.
pub mod model {
    pub use electrobot_model::{Credentials, ErrorKind, ModelProvider};
}
