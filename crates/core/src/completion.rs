use std::future::poll_fn;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use electrobot_model::{
    Credentials, ModelMessage, ModelProvider, ModelRequest, ModelResponse,
    ModelResponseEvent,
};
use futures_util::{Stream, StreamExt, stream};
use tokio::time::timeout;
use tracing::Instrument;

use crate::error::CompletionError;
use crate::transcript::{Role, Turn};

type ChunkResult = Result<String, CompletionError>;
type BoxedChunkStream = Pin<Box<dyn Stream<Item = ChunkResult> + Send>>;
type SendRequestResult = Result<CompletionStream, CompletionError>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, Option<Duration>) -> BoxedSendRequestFuture
        + Send + Sync
>;

/// A wrapper around a model provider that turns its responses into plain
/// text streams and provides a type-erased interface for the other
/// modules.
#[derive(Clone)]
pub struct CompletionClient {
    handler_fn: HandlerFn,
    chunk_timeout: Option<Duration>,
}

impl CompletionClient {
    /// Creates a client for the given provider.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `CompletionClient` doesn't
        // have a generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req, chunk_timeout| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp = with_deadline(chunk_timeout, fut)
                        .await?
                        .map_err(CompletionError::from_provider)?;
                    Ok(CompletionStream::from_response::<P>(
                        resp,
                        chunk_timeout,
                    ))
                }
                .instrument(trace_span!("completion client req")),
            )
        });
        Self {
            handler_fn,
            chunk_timeout: None,
        }
    }

    /// Fails the completion if the provider stays silent for longer than
    /// `deadline`, either before the response starts or between two
    /// chunks.
    #[inline]
    pub fn with_chunk_timeout(mut self, deadline: Duration) -> Self {
        self.chunk_timeout = Some(deadline);
        self
    }

    /// Starts generating a response to `new_message`.
    ///
    /// `history` must not contain `new_message` itself. The returned
    /// stream yields the response text in emission order; concatenating
    /// all items gives the full response.
    ///
    /// This method does not touch any transcript, committing the
    /// response is up to the caller.
    pub async fn generate(
        &self,
        history: &[Turn],
        new_message: &str,
        instructions: Option<&str>,
        credentials: &Credentials,
    ) -> Result<CompletionStream, CompletionError> {
        let req = ModelRequest {
            credentials: credentials.clone(),
            instructions: instructions.map(ToOwned::to_owned),
            history: history.iter().map(create_message).collect(),
            message: new_message.to_owned(),
        };
        (self.handler_fn)(req, self.chunk_timeout).await
    }
}

/// The streamed text of one completion.
///
/// The stream is lazy and can only be consumed once. It ends with `None`
/// when the response is complete. After an error it ends immediately.
pub struct CompletionStream {
    inner: BoxedChunkStream,
}

impl CompletionStream {
    fn from_response<P: ModelProvider + 'static>(
        resp: P::Response,
        chunk_timeout: Option<Duration>,
    ) -> Self {
        trace!("start receiving events");
        let inner = stream::unfold(Some(Box::pin(resp)), move |state| {
            async move {
                let mut resp = state?;
                loop {
                    let next = poll_fn(|cx| resp.as_mut().poll_next_event(cx));
                    let event = match with_deadline(chunk_timeout, next).await {
                        Ok(Ok(event)) => event,
                        Ok(Err(err)) => {
                            error!("got an error: {err:?}");
                            let err = CompletionError::from_provider(err);
                            return Some((Err(err), None));
                        }
                        Err(err) => {
                            error!("{err}");
                            return Some((Err(err), None));
                        }
                    };

                    let Some(event) = event else {
                        trace!("finished a request");
                        return None;
                    };
                    trace!("got an event: {event:?}");

                    match event {
                        ModelResponseEvent::MessageDelta(delta)
                            if delta.is_empty() => {}
                        ModelResponseEvent::MessageDelta(delta) => {
                            return Some((Ok(delta), Some(resp)));
                        }
                        ModelResponseEvent::Completed(reason) => {
                            debug!("model finished: {reason:?}");
                        }
                    }
                }
            }
        });
        Self {
            inner: Box::pin(inner),
        }
    }

    /// Consumes the stream and returns the concatenated text.
    pub async fn collect_text(mut self) -> Result<String, CompletionError> {
        let mut text = String::new();
        while let Some(chunk) = self.next().await {
            text.push_str(&chunk?);
        }
        Ok(text)
    }
}

impl Stream for CompletionStream {
    type Item = Result<String, CompletionError>;

    #[inline]
    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

async fn with_deadline<F: Future>(
    deadline: Option<Duration>,
    fut: F,
) -> Result<F::Output, CompletionError> {
    match deadline {
        Some(deadline) => timeout(deadline, fut)
            .await
            .map_err(|_| CompletionError::timeout(deadline)),
        None => Ok(fut.await),
    }
}

#[inline]
fn create_message(turn: &Turn) -> ModelMessage {
    match turn.role() {
        Role::User => ModelMessage::User(turn.content().to_owned()),
        Role::Assistant => ModelMessage::Assistant(turn.content().to_owned()),
    }
}
