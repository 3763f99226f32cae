/// A line typed at the prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    /// Nothing but whitespace.
    Empty,
    /// A question for the assistant.
    Message(String),
    /// `/key`: enter a new API key.
    EnterKey,
    /// `/history`: redraw the conversation.
    History,
    /// `/help`: list the commands.
    Help,
    /// `/quit` or `/exit`.
    Quit,
    /// Any other line starting with `/`.
    Unknown(String),
}

impl Input {
    /// Parses a raw input line.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Input::Message(line.to_owned());
        };
        match command.trim() {
            "key" => Input::EnterKey,
            "history" => Input::History,
            "help" => Input::Help,
            "quit" | "exit" => Input::Quit,
            other => Input::Unknown(other.to_owned()),
        }
    }
}

/// The help text for the commands above.
pub const HELP: &str = "\
/key      enter a Gemini API key
/history  show the conversation so far
/help     show this help
/quit     leave";
