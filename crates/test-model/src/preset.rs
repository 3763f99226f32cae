use electrobot_model::ErrorKind;
use serde::{Deserialize, Serialize};

/// The error kinds a preset can fail with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetErrorKind {
    Unauthorized,
    Moderated,
    RateLimitExceeded,
    Other,
}

impl From<PresetErrorKind> for ErrorKind {
    fn from(kind: PresetErrorKind) -> Self {
        match kind {
            PresetErrorKind::Unauthorized => ErrorKind::Unauthorized,
            PresetErrorKind::Moderated => ErrorKind::Moderated,
            PresetErrorKind::RateLimitExceeded => ErrorKind::RateLimitExceeded,
            PresetErrorKind::Other => ErrorKind::Other,
        }
    }
}

/// A scripted failure.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetFailure {
    pub kind: PresetErrorKind,
    pub message: String,
}

impl PresetFailure {
    /// Creates a failure with the given kind and message.
    #[inline]
    pub fn new<S: Into<String>>(kind: PresetErrorKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    /// The stream fails at this point, events after it are never sent.
    #[serde(rename = "failure")]
    Failure(PresetFailure),
}

/// The preset response for an assistant step.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request is rejected before any event is streamed.
    pub rejection: Option<PresetFailure>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            rejection: None,
        }
    }

    /// Creates a `PresetResponse` streaming the given text chunks.
    #[inline]
    pub fn with_chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_events(
            chunks
                .into_iter()
                .map(|chunk| PresetEvent::MessageDelta(chunk.into()))
                .collect::<Vec<_>>(),
        )
    }

    /// Creates a `PresetResponse` whose request is rejected.
    #[inline]
    pub fn rejected(failure: PresetFailure) -> Self {
        Self {
            events: vec![],
            rejection: Some(failure),
        }
    }

    /// Returns the full text this response streams before completing or
    /// failing.
    pub fn full_text(&self) -> String {
        self.events
            .iter()
            .map_while(|event| match event {
                PresetEvent::MessageDelta(delta) => Some(delta.as_str()),
                PresetEvent::Failure(_) => None,
            })
            .collect()
    }
}
