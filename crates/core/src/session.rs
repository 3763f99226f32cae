mod builder;
#[cfg(test)]
mod tests;

use electrobot_model::Credentials;
use futures_util::StreamExt;

use crate::completion::CompletionClient;
use crate::error::ChatError;
use crate::render::{DisplayRole, Renderer};
use crate::transcript::{Role, Transcript, Turn};
pub use builder::ChatSessionBuilder;

/// A chat session, which owns the transcript of one conversation and the
/// client used to answer it.
///
/// A session starts with an empty transcript and is torn down by dropping
/// it. Turns are processed one at a time, `submit` takes `&mut self` so
/// completions can never interleave.
pub struct ChatSession {
    client: CompletionClient,
    instructions: Option<String>,
    transcript: Transcript,
}

impl ChatSession {
    fn from_builder(builder: ChatSessionBuilder) -> Self {
        let ChatSessionBuilder {
            client,
            instructions,
            chunk_timeout,
        } = builder;
        let client = match chunk_timeout {
            Some(deadline) => client.with_chunk_timeout(deadline),
            None => client,
        };
        Self {
            client,
            instructions,
            transcript: Transcript::new(),
        }
    }

    /// Returns the transcript of this session.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Draws every stored turn, oldest first.
    pub fn render_history<R: Renderer + ?Sized>(&self, renderer: &mut R) {
        for turn in &self.transcript {
            renderer.render_turn(turn.role().into(), turn.content());
        }
    }

    /// Handles one user input and returns the committed assistant turn.
    ///
    /// Without credentials nothing is sent and the transcript is left
    /// untouched. Otherwise the user turn is recorded before the request
    /// is made, and the answer is streamed into `renderer`. If the
    /// completion fails, the text rendered so far stays visible, but no
    /// assistant turn is recorded.
    pub async fn submit<R: Renderer + ?Sized>(
        &mut self,
        prompt: &str,
        credentials: Option<&Credentials>,
        renderer: &mut R,
    ) -> Result<&Turn, ChatError> {
        let Some(credentials) = credentials else {
            warn!("no credentials, skipping the request");
            return Err(ChatError::MissingCredential);
        };

        renderer.render_turn(DisplayRole::User, prompt);
        self.transcript.append(Role::User, prompt);
        debug!("user turn #{} recorded", self.transcript.len());

        let mut stream = self
            .client
            .generate(
                self.transcript.all_except_last(),
                prompt,
                self.instructions.as_deref(),
                credentials,
            )
            .await?;

        let mut buffer = String::new();
        while let Some(chunk) = stream.next().await {
            buffer.push_str(&chunk?);
            renderer.render_partial(&buffer, true);
        }
        renderer.render_partial(&buffer, false);

        debug!("assistant answered with {} bytes", buffer.len());
        Ok(self.transcript.append(Role::Assistant, buffer))
    }
}
