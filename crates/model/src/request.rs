use crate::Credentials;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The credentials to authenticate the request with.
    pub credentials: Credentials,
    /// The system instructions the model session is seeded with.
    pub instructions: Option<String>,
    /// Prior messages of the conversation, oldest first.
    ///
    /// This never contains [`ModelRequest::message`].
    pub history: Vec<ModelMessage>,
    /// The new user message to respond to.
    pub message: String,
}

/// A complete message in the conversation history.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// A user input text.
    User(String),
    /// An assistant text.
    Assistant(String),
}

impl ModelMessage {
    /// Returns the text of the message.
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            ModelMessage::User(text) | ModelMessage::Assistant(text) => text,
        }
    }
}
