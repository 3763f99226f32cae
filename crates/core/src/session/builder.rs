use std::time::Duration;

use electrobot_model::ModelProvider;

use super::ChatSession;
use crate::completion::CompletionClient;

/// [`ChatSession`] builder.
pub struct ChatSessionBuilder {
    pub(crate) client: CompletionClient,
    pub(crate) instructions: Option<String>,
    pub(crate) chunk_timeout: Option<Duration>,
}

impl ChatSessionBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            client: CompletionClient::new(provider),
            instructions: None,
            chunk_timeout: None,
        }
    }

    /// Sets the system instructions sent with every request.
    #[inline]
    pub fn with_instructions<S: Into<String>>(mut self, instructions: S) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Fails a turn when the model stays silent for longer than
    /// `deadline`.
    #[inline]
    pub fn with_chunk_timeout(mut self, deadline: Duration) -> Self {
        self.chunk_timeout = Some(deadline);
        self
    }

    /// Builds a session with an empty transcript.
    #[inline]
    pub fn build(self) -> ChatSession {
        ChatSession::from_builder(self)
    }
}
