//! The ElectroBot terminal chat.

#[macro_use]
extern crate tracing;

use std::io::Write as _;

use clap::Parser;
use electrobot::core::model::Credentials;
use electrobot::core::render::Renderer;
use electrobot::core::{ChatError, ChatSession, ChatSessionBuilder};
use electrobot::{
    Args, HELP, Input, SYSTEM_PROMPT, TerminalRenderer, load_credentials,
};
use electrobot_gemini_model::GeminiProvider;
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt, BufReader, Lines, Stdin};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let provider = GeminiProvider::new(args.gemini_config());

    println!("{}", "⚡ ElectroBot".bold().bright_yellow());
    println!(
        "{}",
        "Ask me about Arduino, ESP32, Sensors, Circuit Design, or Python for Hardware."
            .dimmed()
    );
    let model_line = format!("Powered by {}", provider.config().model());
    println!("{}", model_line.dimmed());
    println!();

    let mut input = LineReader::new();

    let mut credentials = match load_credentials(&args) {
        Some(credentials) => {
            println!("{}", "API Key loaded from environment! 🔒".green());
            Some(credentials)
        }
        None => enter_key(&mut input).await,
    };
    println!("{}", "Type /help for commands.".dimmed());

    let mut builder =
        ChatSessionBuilder::with_model_provider(provider)
            .with_instructions(SYSTEM_PROMPT);
    if let Some(deadline) = args.chunk_timeout() {
        builder = builder.with_chunk_timeout(deadline);
    }
    let mut session = builder.build();
    let mut renderer = TerminalRenderer::stdout();

    loop {
        print!("{} ", ">".bright_cyan());
        std::io::stdout().flush().ok();

        let Some(line) = input.next_line().await else {
            break;
        };
        match Input::parse(&line) {
            Input::Empty => {}
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::EnterKey => {
                if let Some(new_credentials) = enter_key(&mut input).await {
                    credentials = Some(new_credentials);
                }
            }
            Input::History => redraw(&session),
            Input::Unknown(command) => {
                println!("Unknown command /{command}. Type /help for commands.");
            }
            Input::Message(prompt) => {
                handle_turn(
                    &mut session,
                    &prompt,
                    credentials.as_ref(),
                    &mut renderer,
                )
                .await;
            }
        }
    }

    info!("session ended after {} turns", session.transcript().len());
}

async fn handle_turn(
    session: &mut ChatSession,
    prompt: &str,
    credentials: Option<&Credentials>,
    renderer: &mut TerminalRenderer,
) {
    let result = session.submit(prompt, credentials, renderer).await;
    if let Err(err) = result {
        match &err {
            ChatError::MissingCredential => warn!("{err}"),
            ChatError::Completion(cause) => {
                error!("completion failed ({}): {cause}", cause.kind());
            }
        }
        renderer.render_error(&err);
    }
}

fn redraw(session: &ChatSession) {
    if session.transcript().is_empty() {
        println!("{}", "No messages yet.".dimmed());
        return;
    }
    let mut renderer = TerminalRenderer::new(std::io::stdout()).echo_input(true);
    session.render_history(&mut renderer);
}

async fn enter_key(input: &mut LineReader) -> Option<Credentials> {
    println!(
        "{}",
        "Get your key at https://aistudio.google.com/".dimmed()
    );
    print!("Enter Gemini API Key: ");
    std::io::stdout().flush().ok();

    let line = input.next_line().await?;
    let credentials = Credentials::new(line.trim());
    if credentials.is_none() {
        println!("{}", "No key entered.".yellow());
    }
    credentials
}

struct LineReader {
    lines: Lines<BufReader<Stdin>>,
}

impl LineReader {
    fn new() -> Self {
        Self {
            lines: BufReader::new(io::stdin()).lines(),
        }
    }

    async fn next_line(&mut self) -> Option<String> {
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(err) => {
                error!("error reading input: {}", err);
                None
            }
        }
    }
}
