use std::time::Duration;

use clap::Parser;
use electrobot_gemini_model::{GeminiConfig, GeminiConfigBuilder};
use electrobot_model::Credentials;

/// The fixed instructions every conversation starts with.
pub const SYSTEM_PROMPT: &str = include_str!("./system_prompt.md");

/// Command line arguments.
///
/// Every option can also be provided through the environment.
#[derive(Clone, Parser)]
#[command(
    name = "electrobot",
    version,
    about = "Ask about Arduino, ESP32, sensors, circuit design, or Python for hardware."
)]
pub struct Args {
    /// Gemini API key. Prompted for when absent.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// The model to chat with. Defaults to Gemini 2.5 Flash.
    #[arg(long, env = "GEMINI_MODEL")]
    pub model: Option<String>,

    /// Custom API base URL.
    #[arg(long, env = "GEMINI_BASE_URL")]
    pub base_url: Option<String>,

    /// Give up on an answer when no text arrives for this many seconds.
    #[arg(long, env = "ELECTROBOT_CHUNK_TIMEOUT_SECS")]
    pub chunk_timeout_secs: Option<u64>,
}

impl Args {
    /// Builds the provider configuration.
    pub fn gemini_config(&self) -> GeminiConfig {
        let mut builder = GeminiConfigBuilder::new();
        if let Some(model) = &self.model {
            builder = builder.with_model(model);
        }
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url);
        }
        builder.build()
    }

    /// Returns the per-chunk deadline, if any. Zero disables it.
    pub fn chunk_timeout(&self) -> Option<Duration> {
        self.chunk_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Returns the credentials provisioned before start, via flag or
/// environment, if any.
pub fn load_credentials(args: &Args) -> Option<Credentials> {
    Credentials::new(args.api_key.clone()?)
}
