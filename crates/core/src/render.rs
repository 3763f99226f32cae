//! The boundary towards whatever draws the conversation.

use std::fmt::{self, Display};

use crate::error::ChatError;
use crate::transcript::Role;

/// Appended to a streaming turn while more text may follow.
pub const IN_PROGRESS_MARKER: &str = "▌";

/// The label a turn is displayed with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayRole {
    /// Shown as `user`.
    User,
    /// Shown as `assistant`.
    Assistant,
}

impl DisplayRole {
    /// Returns the display label.
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            DisplayRole::User => "user",
            DisplayRole::Assistant => "assistant",
        }
    }
}

impl From<Role> for DisplayRole {
    #[inline]
    fn from(role: Role) -> Self {
        match role {
            Role::User => DisplayRole::User,
            Role::Assistant => DisplayRole::Assistant,
        }
    }
}

impl Display for DisplayRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Draws the conversation.
///
/// The session drives a renderer in this order for every turn:
/// `render_turn` for the user input, `render_partial` with
/// `streaming = true` after each received chunk, and a final
/// `render_partial` with `streaming = false` once the answer is
/// complete. The `buffer` passed to `render_partial` is always the
/// whole answer so far, not the latest chunk.
pub trait Renderer {
    /// Draws a finished turn.
    fn render_turn(&mut self, role: DisplayRole, content: &str);

    /// Draws the answer currently being streamed.
    ///
    /// While `streaming` is `true` the renderer should mark the text as
    /// unfinished, e.g. with [`IN_PROGRESS_MARKER`].
    fn render_partial(&mut self, buffer: &str, streaming: bool);

    /// Reports an error of the current turn.
    fn render_error(&mut self, err: &ChatError);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(DisplayRole::from(Role::User).label(), "user");
        assert_eq!(DisplayRole::from(Role::Assistant).to_string(), "assistant");
    }
}
