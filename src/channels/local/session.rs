use crate::consultation::{ConsultationView, SessionController};
use crate::provider::CompletionGateway;
use crate::transcript::{Speaker, Turn};
use std::io::{self, BufRead, Write};

pub const CHAT_EXIT_COMMANDS: &[&str] = &["/exit"];
pub const CHAT_RESET_COMMANDS: &[&str] = &["/new"];
pub const CHAT_TITLE: &str = "🩺 Tbibkom — Assistant médical intelligent multilingue";
pub const CHAT_INPUT_HINT: &str = "Pose ta question médicale (FR, عربي, Darija)...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Exit,
    Reset,
    Message(String),
    Empty,
}

/// Only slash commands are reserved; anything else is sent as typed, minus
/// the line terminator.
pub fn parse_chat_input(raw: &str) -> ChatCommand {
    let line = raw.trim_end_matches(['\n', '\r']);
    let command = line.trim();
    if command.is_empty() {
        return ChatCommand::Empty;
    }
    if CHAT_EXIT_COMMANDS
        .iter()
        .any(|known| command.eq_ignore_ascii_case(known))
    {
        return ChatCommand::Exit;
    }
    if CHAT_RESET_COMMANDS
        .iter()
        .any(|known| command.eq_ignore_ascii_case(known))
    {
        return ChatCommand::Reset;
    }
    ChatCommand::Message(line.to_string())
}

pub fn run_plain_chat_stdio<G: CompletionGateway>(
    controller: &mut SessionController<G>,
) -> Result<(), String> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut output = stdout.lock();
    run_plain_chat(controller, &mut input, &mut output)
}

pub fn run_plain_chat<G: CompletionGateway, R: BufRead, W: Write>(
    controller: &mut SessionController<G>,
    input: &mut R,
    output: &mut W,
) -> Result<(), String> {
    writeln!(output, "{CHAT_TITLE}").map_err(|e| format!("failed to write chat output: {e}"))?;
    writeln!(output, "type `/new` for a new consultation, `/exit` to quit")
        .map_err(|e| format!("failed to write chat output: {e}"))?;

    loop {
        write!(output, "you> ").map_err(|e| format!("failed to write chat prompt: {e}"))?;
        output
            .flush()
            .map_err(|e| format!("failed to flush chat prompt: {e}"))?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .map_err(|e| format!("failed to read chat input: {e}"))?;
        if read == 0 {
            break;
        }

        let mut view = WriterView::new(output);
        match parse_chat_input(&line) {
            ChatCommand::Empty => continue,
            ChatCommand::Exit => break,
            ChatCommand::Reset => controller.reset(&mut view),
            ChatCommand::Message(message) => {
                controller.submit(&message, &mut view);
            }
        }
        view.finish()?;
    }

    Ok(())
}

/// Line-oriented view. User turns are not echoed because the patient's line
/// is already on screen.
struct WriterView<'a, W: Write> {
    output: &'a mut W,
    failure: Option<io::Error>,
}

impl<'a, W: Write> WriterView<'a, W> {
    fn new(output: &'a mut W) -> Self {
        Self {
            output,
            failure: None,
        }
    }

    fn write_line(&mut self, prefix: &str, text: &str) {
        if self.failure.is_some() {
            return;
        }
        let result = writeln!(self.output, "{prefix}> {text}").and_then(|_| self.output.flush());
        if let Err(err) = result {
            self.failure = Some(err);
        }
    }

    fn finish(self) -> Result<(), String> {
        match self.failure {
            Some(err) => Err(format!("failed to write chat output: {err}")),
            None => Ok(()),
        }
    }
}

impl<W: Write> ConsultationView for WriterView<'_, W> {
    fn show_turn(&mut self, turn: &Turn) {
        if turn.speaker() == Speaker::Assistant {
            self.write_line("assistant", turn.content());
        }
    }

    fn show_error(&mut self, message: &str) {
        self.write_line("error", message);
    }

    fn show_notice(&mut self, message: &str) {
        self.write_line("notice", message);
    }
}
