use std::io::{self, Stdout, Write};
use std::time::Duration;

use electrobot_core::ChatError;
use electrobot_core::render::{DisplayRole, IN_PROGRESS_MARKER, Renderer};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

const BAR_CHAR: &str = "▎";
// Moves back over the marker, blanks it, and moves back again.
const ERASE_MARKER: &str = "\u{8} \u{8}";

/// Draws the conversation on a terminal.
///
/// Streaming answers are printed incrementally: each call to
/// `render_partial` only writes the text not printed yet, followed by
/// [`IN_PROGRESS_MARKER`], which is erased again before the next write.
pub struct TerminalRenderer<W = Stdout> {
    out: W,
    echo_input: bool,
    spinner_style: Option<ProgressStyle>,
    progress_bar: Option<ProgressBar>,
    // Bytes of the current answer already written.
    printed: usize,
    answering: bool,
    marker_shown: bool,
}

impl TerminalRenderer<Stdout> {
    /// Creates a renderer for the standard output, with a "thinking"
    /// spinner while the answer has not started yet.
    pub fn stdout() -> Self {
        let spinner_style = ProgressStyle::with_template("{spinner} {wide_msg}")
            .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
            .map_err(|err| warn!("spinner disabled: {err}"))
            .ok();
        Self {
            spinner_style,
            ..Self::new(io::stdout())
        }
    }
}

impl<W: Write> TerminalRenderer<W> {
    /// Creates a renderer writing to `out`, without spinner.
    pub fn new(out: W) -> Self {
        Self {
            out,
            echo_input: false,
            spinner_style: None,
            progress_bar: None,
            printed: 0,
            answering: false,
            marker_shown: false,
        }
    }

    /// Whether user turns are printed.
    ///
    /// Live input is already on screen after the user typed it, so this
    /// is off by default. Turn it on to redraw a whole conversation.
    pub fn echo_input(mut self, echo_input: bool) -> Self {
        self.echo_input = echo_input;
        self
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn start_spinner(&mut self) {
        let Some(style) = &self.spinner_style else {
            return;
        };
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(style.clone());
        progress_bar.set_message("🤔 Thinking...");
        progress_bar.enable_steady_tick(Duration::from_millis(100));
        self.progress_bar = Some(progress_bar);
    }

    // Finish the progress bar before printing anything else.
    fn stop_spinner(&mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }

    fn write_turn(&mut self, role: DisplayRole, content: &str) -> io::Result<()> {
        match role {
            DisplayRole::User => writeln!(
                self.out,
                "{}👤 {}",
                BAR_CHAR.bright_green(),
                content.bold()
            )?,
            DisplayRole::Assistant => writeln!(
                self.out,
                "{}🤖 {}",
                BAR_CHAR.bright_cyan(),
                content.bright_white()
            )?,
        }
        self.out.flush()
    }

    fn write_partial(&mut self, buffer: &str, streaming: bool) -> io::Result<()> {
        if self.marker_shown {
            self.out.write_all(ERASE_MARKER.as_bytes())?;
            self.marker_shown = false;
        }
        if !self.answering {
            write!(self.out, "{}🤖 ", BAR_CHAR.bright_cyan())?;
            self.answering = true;
            self.printed = 0;
        }

        // The buffer only ever grows, so everything past `printed` is new.
        let new_text = buffer.get(self.printed..).unwrap_or_default();
        write!(self.out, "{}", new_text.bright_white())?;
        self.printed = buffer.len();

        if streaming {
            write!(self.out, "{}", IN_PROGRESS_MARKER.dimmed())?;
            self.marker_shown = true;
        } else {
            writeln!(self.out)?;
            self.answering = false;
            self.printed = 0;
        }
        self.out.flush()
    }

    fn write_error(&mut self, err: &ChatError) -> io::Result<()> {
        if self.marker_shown {
            self.out.write_all(ERASE_MARKER.as_bytes())?;
            self.marker_shown = false;
        }
        if self.answering {
            writeln!(self.out)?;
            self.answering = false;
            self.printed = 0;
        }
        let message = match err {
            ChatError::MissingCredential => {
                "Please enter a Gemini API Key (type /key).".to_owned()
            }
            ChatError::Completion(err) => err.to_string(),
        };
        writeln!(self.out, "{} {}", "Error:".bright_red().bold(), message)?;
        self.out.flush()
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render_turn(&mut self, role: DisplayRole, content: &str) {
        if role == DisplayRole::User && !self.echo_input {
            self.start_spinner();
            return;
        }
        self.stop_spinner();
        if let Err(err) = self.write_turn(role, content) {
            error!("failed to draw a turn: {err}");
        }
    }

    fn render_partial(&mut self, buffer: &str, streaming: bool) {
        self.stop_spinner();
        if let Err(err) = self.write_partial(buffer, streaming) {
            error!("failed to draw the answer: {err}");
        }
    }

    fn render_error(&mut self, err: &ChatError) {
        self.stop_spinner();
        if let Err(err) = self.write_error(err) {
            error!("failed to draw an error: {err}");
        }
    }
}
