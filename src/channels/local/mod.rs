mod session;
mod tui;

pub use session::{
    parse_chat_input, run_plain_chat, ChatCommand, CHAT_EXIT_COMMANDS, CHAT_INPUT_HINT,
    CHAT_RESET_COMMANDS, CHAT_TITLE,
};

use crate::consultation::SessionController;
use crate::provider::CompletionGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSurface {
    Terminal,
    Plain,
}

pub fn run_local_consultation<G: CompletionGateway>(
    controller: &mut SessionController<G>,
    surface: ChatSurface,
) -> Result<String, String> {
    match surface {
        ChatSurface::Terminal => tui::run_consultation_tui(controller)?,
        ChatSurface::Plain => session::run_plain_chat_stdio(controller)?,
    }
    Ok(format!(
        "consultation ended\nturns={}",
        controller.session().len()
    ))
}
