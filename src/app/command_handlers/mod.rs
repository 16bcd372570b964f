use crate::app::cli::{help_text, parse_cli_verb, CliVerb};

pub mod chat;
pub mod doctor;

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Chat => chat::cmd_chat(&args[1..]),
        CliVerb::Doctor => doctor::cmd_doctor(&args[1..]),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}
