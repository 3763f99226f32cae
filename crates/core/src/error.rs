use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::time::Duration;

use electrobot_model::{ErrorKind, ModelProviderError};

/// A failure while configuring, opening or streaming a completion.
#[derive(Debug)]
pub struct CompletionError {
    kind: ErrorKind,
    message: String,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl CompletionError {
    pub(crate) fn from_provider<E: ModelProviderError>(err: E) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    pub(crate) fn timeout(deadline: Duration) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            message: format!(
                "no response from the model within {:.1}s",
                deadline.as_secs_f64()
            ),
            source: None,
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for CompletionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn StdError + 'static))
    }
}

/// A failure of one chat turn.
///
/// Every variant is terminal for the turn it happened in, but leaves the
/// session usable.
#[derive(Debug)]
pub enum ChatError {
    /// No API key was available, the request was not attempted.
    MissingCredential,
    /// The completion failed.
    Completion(CompletionError),
}

impl ChatError {
    /// Returns the completion error, if this is one.
    #[inline]
    pub fn as_completion(&self) -> Option<&CompletionError> {
        match self {
            ChatError::MissingCredential => None,
            ChatError::Completion(err) => Some(err),
        }
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::MissingCredential => write!(f, "no API key available"),
            ChatError::Completion(err) => write!(f, "{err}"),
        }
    }
}

impl StdError for ChatError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ChatError::MissingCredential => None,
            ChatError::Completion(err) => Some(err),
        }
    }
}

impl From<CompletionError> for ChatError {
    #[inline]
    fn from(err: CompletionError) -> Self {
        ChatError::Completion(err)
    }
}
