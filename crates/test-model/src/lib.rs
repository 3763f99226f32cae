//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use electrobot_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new<S: Into<String>>(message: S, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

impl From<&PresetFailure> for Error {
    fn from(failure: &PresetFailure) -> Self {
        Self::new(failure.message.clone(), failure.kind.into())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    preset: PresetResponse,
    delay: Duration,
    event_idx: usize,
    finished: bool,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if this.finished {
            return Poll::Ready(Ok(None));
        }

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            let preset_events = &this.preset.events;
            if this.event_idx < preset_events.len() {
                let event = match &preset_events[this.event_idx] {
                    PresetEvent::MessageDelta(msg) => {
                        ModelResponseEvent::MessageDelta(msg.clone())
                    }
                    PresetEvent::Failure(failure) => {
                        this.finished = true;
                        return Poll::Ready(Err(failure.into()));
                    }
                };
                this.event_idx += 1;
                return Poll::Ready(Ok(Some(event)));
            }

            this.finished = true;
            return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                ModelFinishReason::Stop,
            ))));
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

#[derive(Clone)]
enum ConversationStep {
    UserInput,
    AssistantResponse(PresetResponse),
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the conversation script, which
/// is how the model should respond to a request. The step is selected by the
/// position of the new message in the conversation, so a request with two
/// history messages is answered by the fourth step. If there are no enough
/// steps in the script, an error will be returned.
///
/// Every request is recorded and can be inspected with
/// [`TestModelProvider::requests`].
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    conversation_script: Vec<ConversationStep>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_assistant_response_step(&mut self, preset: PresetResponse) {
        self.conversation_script
            .push(ConversationStep::AssistantResponse(preset));
    }

    #[inline]
    pub fn add_user_input_step(&mut self) {
        self.conversation_script.push(ConversationStep::UserInput);
    }

    /// Adds a user step followed by the given assistant response.
    #[inline]
    pub fn add_exchange(&mut self, preset: PresetResponse) {
        self.add_user_input_step();
        self.add_assistant_response_step(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn select_step(&self, req: &ModelRequest) -> Result<PresetResponse, Error> {
        let step_idx = req.history.len() + 1;
        match self.conversation_script.get(step_idx) {
            None => Err(Error::new("no enough steps", ErrorKind::Other)),
            Some(ConversationStep::UserInput) => Err(Error::new(
                "not an assistant response step",
                ErrorKind::Other,
            )),
            Some(ConversationStep::AssistantResponse(preset)) => {
                match &preset.rejection {
                    Some(failure) => Err(failure.into()),
                    None => Ok(preset.clone()),
                }
            }
        }
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(req.clone());
        }
        let resp = self.select_step(req).map(|preset| TestModelResponse {
            preset,
            delay: self.delay.unwrap_or(Duration::from_millis(1)),
            event_idx: 0,
            finished: false,
            sleep: None,
        });
        ready(resp)
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use electrobot_model::{Credentials, ModelMessage};

    use super::*;

    async fn collect_response(
        resp: TestModelResponse,
    ) -> Result<String, (String, Error)> {
        let mut resp = pin!(resp);
        let mut msg = String::new();
        loop {
            let event = match poll_fn(|cx| resp.as_mut().poll_next_event(cx))
                .await
            {
                Ok(Some(event)) => event,
                Ok(None) => return Ok(msg),
                Err(err) => return Err((msg, err)),
            };
            match event {
                ModelResponseEvent::Completed(_) => {}
                ModelResponseEvent::MessageDelta(delta) => {
                    msg.push_str(&delta);
                }
            }
        }
    }

    fn request(history: Vec<ModelMessage>, message: &str) -> ModelRequest {
        ModelRequest {
            credentials: Credentials::new("test-key").unwrap(),
            instructions: None,
            history,
            message: message.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut provider = TestModelProvider::default();
        provider.add_exchange(PresetResponse::with_chunks(["Hello, ", "world!"]));
        provider.add_exchange(PresetResponse::with_chunks([
            "Sure, ",
            "let me take a ",
            "look.",
        ]));

        let resp = provider.send_request(&request(vec![], "Hi")).await.unwrap();
        let msg = collect_response(resp).await.unwrap();
        assert_eq!(msg, "Hello, world!");

        let history = vec![
            ModelMessage::User("Hi".to_owned()),
            ModelMessage::Assistant(msg),
        ];
        let resp = provider
            .send_request(&request(history, "Check my wiring"))
            .await
            .unwrap();
        let msg = collect_response(resp).await.unwrap();
        assert_eq!(msg, "Sure, let me take a look.");

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].message, "Check my wiring");
    }

    #[tokio::test]
    async fn test_failures() {
        let mut provider = TestModelProvider::default();
        provider.add_exchange(PresetResponse::with_events([
            PresetEvent::MessageDelta("Partial".to_owned()),
            PresetEvent::Failure(PresetFailure::new(
                PresetErrorKind::Other,
                "connection reset",
            )),
        ]));

        let resp = provider.send_request(&request(vec![], "Hi")).await.unwrap();
        let (partial, err) = collect_response(resp).await.unwrap_err();
        assert_eq!(partial, "Partial");
        assert_eq!(err.to_string(), "connection reset");

        // No step for a conversation this long.
        let history = vec![
            ModelMessage::User("Hi".to_owned()),
            ModelMessage::Assistant("Partial".to_owned()),
        ];
        let err = provider
            .send_request(&request(history, "Again"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[tokio::test]
    async fn test_rejection() {
        let mut provider = TestModelProvider::default();
        provider.add_exchange(PresetResponse::rejected(PresetFailure::new(
            PresetErrorKind::Moderated,
            "blocked",
        )));
        let err = provider
            .send_request(&request(vec![], "Hi"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Moderated);
    }
}
