use std::time::Duration;

use electrobot_model::{Credentials, ErrorKind};
use electrobot_test_model::{
    PresetErrorKind, PresetEvent, PresetFailure, PresetResponse,
    TestModelProvider,
};

use crate::render::{DisplayRole, IN_PROGRESS_MARKER, Renderer};
use crate::transcript::{Role, Transcript, Turn};
use crate::{ChatError, ChatSessionBuilder};

const QUESTION: &str = "What pin on ESP32 is safe for a DHT11 data line?";

/// Records what a screen would show after every call.
#[derive(Default)]
struct RecordingRenderer {
    frames: Vec<String>,
    errors: Vec<String>,
}

impl Renderer for RecordingRenderer {
    fn render_turn(&mut self, role: DisplayRole, content: &str) {
        self.frames.push(format!("{role}: {content}"));
    }

    fn render_partial(&mut self, buffer: &str, streaming: bool) {
        let marker = if streaming { IN_PROGRESS_MARKER } else { "" };
        self.frames.push(format!("assistant: {buffer}{marker}"));
    }

    fn render_error(&mut self, err: &ChatError) {
        self.errors.push(format!("Error: {err}"));
    }
}

fn credentials() -> Credentials {
    Credentials::new("test-key").unwrap()
}

#[tokio::test]
async fn test_first_question() {
    let mut provider = TestModelProvider::default();
    provider.add_exchange(PresetResponse::with_chunks([
        "GPIO4 ",
        "is commonly used...",
    ]));

    let mut session = ChatSessionBuilder::with_model_provider(provider.clone())
        .with_instructions("You are an expert Embedded Systems Engineer.")
        .build();
    assert!(session.transcript().is_empty());

    let mut renderer = RecordingRenderer::default();
    let turn = session
        .submit(QUESTION, Some(&credentials()), &mut renderer)
        .await
        .unwrap();
    assert_eq!(turn, &Turn::new(Role::Assistant, "GPIO4 is commonly used..."));

    assert_eq!(
        session.transcript().all(),
        [
            Turn::new(Role::User, QUESTION),
            Turn::new(Role::Assistant, "GPIO4 is commonly used..."),
        ]
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].history.is_empty());
    assert_eq!(requests[0].message, QUESTION);
    assert_eq!(
        requests[0].instructions.as_deref(),
        Some("You are an expert Embedded Systems Engineer.")
    );

    assert_eq!(
        renderer.frames,
        [
            format!("user: {QUESTION}"),
            "assistant: GPIO4 ▌".to_owned(),
            "assistant: GPIO4 is commonly used...▌".to_owned(),
            "assistant: GPIO4 is commonly used...".to_owned(),
        ]
    );
    assert!(renderer.errors.is_empty());
}

#[tokio::test]
async fn test_roles_alternate() {
    let mut provider = TestModelProvider::default();
    for answer in ["Use GPIO4.", "A 10k pull-up.", "Yes, 3.3V works."] {
        provider.add_exchange(PresetResponse::with_chunks([answer]));
    }
    let mut session =
        ChatSessionBuilder::with_model_provider(provider.clone()).build();
    let mut renderer = RecordingRenderer::default();

    for question in ["Which pin?", "Which resistor?", "Can I use 3.3V?"] {
        session
            .submit(question, Some(&credentials()), &mut renderer)
            .await
            .unwrap();
    }

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 6);
    for (idx, turn) in transcript.iter().enumerate() {
        let expected = if idx % 2 == 0 { Role::User } else { Role::Assistant };
        assert_eq!(turn.role(), expected);
    }

    // Every request carries all prior turns but never the new message.
    let requests = provider.requests();
    for (idx, req) in requests.iter().enumerate() {
        assert_eq!(req.history.len(), idx * 2);
        assert!(req.history.iter().all(|msg| msg.text() != req.message));
    }
}

#[tokio::test]
async fn test_missing_credentials() {
    let mut provider = TestModelProvider::default();
    provider.add_exchange(PresetResponse::with_chunks(["unused"]));
    let mut session =
        ChatSessionBuilder::with_model_provider(provider.clone()).build();
    let mut renderer = RecordingRenderer::default();

    let err = session
        .submit(QUESTION, None, &mut renderer)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::MissingCredential));
    assert!(session.transcript().is_empty());
    assert!(provider.requests().is_empty());
    assert!(renderer.frames.is_empty());

    // Blank keys never become credentials in the first place.
    let blank = Credentials::new("   ");
    let err = session
        .submit(QUESTION, blank.as_ref(), &mut renderer)
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::MissingCredential));
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn test_mid_stream_failure() {
    let mut provider = TestModelProvider::default();
    provider.add_exchange(PresetResponse::with_events([
        PresetEvent::MessageDelta("GPIO4 ".to_owned()),
        PresetEvent::Failure(PresetFailure::new(
            PresetErrorKind::Other,
            "connection reset",
        )),
    ]));
    // Answers the follow-up, whose history holds the unanswered question.
    provider.add_assistant_response_step(PresetResponse::with_chunks([
        "I'm here.",
    ]));
    let mut session =
        ChatSessionBuilder::with_model_provider(provider.clone()).build();
    let mut renderer = RecordingRenderer::default();

    let err = session
        .submit(QUESTION, Some(&credentials()), &mut renderer)
        .await
        .unwrap_err();
    renderer.render_error(&err);

    assert_eq!(err.as_completion().unwrap().kind(), ErrorKind::Other);
    // The partial answer stays on screen.
    assert_eq!(
        renderer.frames.last().map(String::as_str),
        Some("assistant: GPIO4 ▌")
    );
    assert_eq!(renderer.errors, ["Error: connection reset"]);
    // Only the user turn was recorded.
    assert_eq!(
        session.transcript().all(),
        [Turn::new(Role::User, QUESTION)]
    );

    // The session is still usable.
    session
        .submit("Are you there?", Some(&credentials()), &mut renderer)
        .await
        .unwrap();
    assert_eq!(
        session.transcript().all(),
        [
            Turn::new(Role::User, QUESTION),
            Turn::new(Role::User, "Are you there?"),
            Turn::new(Role::Assistant, "I'm here."),
        ]
    );
    assert_eq!(provider.requests()[1].history.len(), 1);
}

#[tokio::test]
async fn test_rejected_request() {
    let mut provider = TestModelProvider::default();
    provider.add_exchange(PresetResponse::rejected(PresetFailure::new(
        PresetErrorKind::Unauthorized,
        "API key not valid",
    )));
    let mut session = ChatSessionBuilder::with_model_provider(provider).build();
    let mut renderer = RecordingRenderer::default();

    let err = session
        .submit(QUESTION, Some(&credentials()), &mut renderer)
        .await
        .unwrap_err();
    assert_eq!(err.as_completion().unwrap().kind(), ErrorKind::Unauthorized);
    assert_eq!(err.to_string(), "API key not valid");
    assert_eq!(renderer.frames, [format!("user: {QUESTION}")]);
    assert_eq!(session.transcript().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_chunk_timeout() {
    let mut provider = TestModelProvider::default();
    provider.add_exchange(PresetResponse::with_chunks(["late"]));
    provider.set_delay(Duration::from_secs(60));
    let mut session = ChatSessionBuilder::with_model_provider(provider)
        .with_chunk_timeout(Duration::from_secs(10))
        .build();
    let mut renderer = RecordingRenderer::default();

    let err = session
        .submit(QUESTION, Some(&credentials()), &mut renderer)
        .await
        .unwrap_err();
    assert_eq!(err.as_completion().unwrap().kind(), ErrorKind::Timeout);
    assert_eq!(session.transcript().len(), 1);
}

#[test]
fn test_malformed_turn_renders_like_plain() {
    let plain: Transcript = serde_json::from_str(
        r#"[{"role": "user", "parts": "Hi"}, {"role": "model", "parts": "Use GPIO4."}]"#,
    )
    .unwrap();
    let listed: Transcript = serde_json::from_str(
        r#"[{"role": "user", "parts": ["Hi"]}, {"role": "model", "parts": ["Use GPIO4."]}]"#,
    )
    .unwrap();

    let render = |transcript: &Transcript| {
        let mut renderer = RecordingRenderer::default();
        for turn in transcript {
            renderer.render_turn(turn.role().into(), turn.content());
        }
        renderer.frames
    };
    assert_eq!(render(&plain), render(&listed));
    assert_eq!(render(&listed), ["user: Hi", "assistant: Use GPIO4."]);
}
