use std::pin::Pin;
use std::task::{Context, Poll, ready};

use electrobot_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::Sse;
use crate::proto::GenerateContentResponse;

// Finish reasons that mean the output was withheld by the service.
const MODERATED_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "IMAGE_SAFETY",
];

struct PartialState {
    sse: Sse,
    // Emitted after the text delta that arrived in the same chunk.
    pending_finish_reason: Option<ModelFinishReason>,
    pending_failure: Option<Error>,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, PartialState), Error>;

pin_project! {
    pub struct GeminiResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl GeminiResponse {
    #[inline]
    pub fn from_sse(sse: Sse) -> Self {
        let partial_state = PartialState {
            sse,
            pending_finish_reason: None,
            pending_failure: None,
        };
        let next_event_fut = async move { next_event(partial_state).await };
        Self {
            next_event_fut: Some(Box::pin(next_event_fut)),
        }
    }
}

impl ModelResponse for GeminiResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        let (event, partial_state) =
            match ready!(next_event_fut.as_mut().poll(cx)) {
                Ok((Some(event), partial_state)) => (event, partial_state),
                Ok((None, _)) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Ok(None));
                }
                Err(err) => {
                    *this.next_event_fut = None;
                    return Poll::Ready(Err(err));
                }
            };

        // The stream may still have more data to pull, create a new future for
        // the next event.
        let next_event_fut = async move { next_event(partial_state).await };
        *this.next_event_fut = Some(Box::pin(next_event_fut));

        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(
    mut partial_state: PartialState,
) -> Result<(Option<ModelResponseEvent>, PartialState), Error> {
    if let Some(failure) = partial_state.pending_failure.take() {
        return Err(failure);
    }
    if let Some(finish_reason) = partial_state.pending_finish_reason.take() {
        return Ok((
            Some(ModelResponseEvent::Completed(finish_reason)),
            partial_state,
        ));
    }

    let sse = &mut partial_state.sse;
    loop {
        let sse_event = match sse.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                return Err(Error::new(format!("{err}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {sse_event}");

        let chunk = serde_json::from_str::<GenerateContentResponse>(&sse_event)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
        if let Some(error) = chunk.error {
            return Err(Error::from_detail(None, error));
        }
        if let Some(reason) =
            chunk.prompt_feedback.and_then(|f| f.block_reason)
        {
            return Err(Error::new(
                format!("The prompt was blocked ({reason})"),
                ErrorKind::Moderated,
            ));
        }

        let Some(candidate) = chunk.candidates.into_iter().next() else {
            continue;
        };
        let text = candidate
            .content
            .map(|content| content.answer_text())
            .unwrap_or_default();

        let finish_reason = match candidate.finish_reason.as_deref() {
            None => None,
            Some(reason) if MODERATED_FINISH_REASONS.contains(&reason) => {
                let failure = Error::new(
                    format!("The response was blocked ({reason})"),
                    ErrorKind::Moderated,
                );
                if text.is_empty() {
                    return Err(failure);
                }
                partial_state.pending_failure = Some(failure);
                return Ok((
                    Some(ModelResponseEvent::MessageDelta(text)),
                    partial_state,
                ));
            }
            Some("MAX_TOKENS") => Some(ModelFinishReason::MaxTokens),
            Some("STOP") => Some(ModelFinishReason::Stop),
            Some(reason) => {
                warn!("unexpected finish reason: {reason}");
                Some(ModelFinishReason::Stop)
            }
        };

        // The order of events are important. Always emit message delta
        // first, then emit the finish reason.
        if !text.is_empty() {
            partial_state.pending_finish_reason = finish_reason;
            return Ok((
                Some(ModelResponseEvent::MessageDelta(text)),
                partial_state,
            ));
        }
        if let Some(finish_reason) = finish_reason {
            return Ok((
                Some(ModelResponseEvent::Completed(finish_reason)),
                partial_state,
            ));
        }
    }

    Ok((None, partial_state))
}
