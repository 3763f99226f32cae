//! A provider-neutral protocol for streaming text completions.
//!
//! This crate establishes a unified protocol for the chat session to talk
//! to a remote generative-text service, so that the session logic never
//! depends on one vendor's wire format.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod credentials;
mod error;
mod provider;
mod request;
mod response;

pub use credentials::*;
pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
