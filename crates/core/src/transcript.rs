//! Conversation transcript types.

use std::slice;

use serde::{Deserialize, Deserializer, Serialize};

/// The author of a turn.
///
/// The stored role is protocol-agnostic. Providers that call the
/// assistant something else (Gemini says `"model"`) translate on their
/// own wire, and `"model"` is accepted when deserializing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions.
    User,
    /// The model answering them.
    #[serde(alias = "model")]
    Assistant,
}

/// One exchange unit of the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    #[serde(alias = "parts", deserialize_with = "deserialize_content")]
    content: String,
}

impl Turn {
    /// Creates a turn.
    #[inline]
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Returns the author of this turn.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of this turn.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Parts(Vec<String>),
}

// Some producers store the text as a list of parts. Only the first part
// carries content.
fn deserialize_content<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawContent::deserialize(deserializer)? {
        RawContent::Text(text) => text,
        RawContent::Parts(parts) => {
            if parts.len() > 1 {
                debug!("ignoring {} extra content parts", parts.len() - 1);
            }
            parts.into_iter().next().unwrap_or_default()
        }
    })
}

/// An ordered, append-only log of turns.
///
/// A transcript is owned by exactly one session and lives as long as it.
#[derive(Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transcript from existing turns, keeping their order.
    #[inline]
    pub fn from_turns(turns: impl IntoIterator<Item = Turn>) -> Self {
        Self {
            turns: turns.into_iter().collect(),
        }
    }

    /// Adds a turn to the end and returns it.
    ///
    /// Role alternation is not validated.
    pub fn append<S: Into<String>>(&mut self, role: Role, content: S) -> &Turn {
        self.turns.push(Turn::new(role, content));
        let idx = self.turns.len() - 1;
        &self.turns[idx]
    }

    /// Returns all turns in append order.
    #[inline]
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns all turns except the most recently appended one.
    ///
    /// This is the history for a new completion request, whose newest
    /// user turn is sent separately.
    #[inline]
    pub fn all_except_last(&self) -> &[Turn] {
        match self.turns.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }

    /// Returns the most recently appended turn.
    #[inline]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Returns the number of turns.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if no turn has been appended.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Iterates over the turns in append order.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Turn> {
        self.turns.iter()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = slice::Iter<'a, Turn>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
