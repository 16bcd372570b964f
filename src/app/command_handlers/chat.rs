use crate::app::command_support::{
    build_controller, load_environment, load_settings, parse_command_options, require_api_key,
};
use crate::channels::local::{run_local_consultation, ChatSurface};

pub fn cmd_chat(args: &[String]) -> Result<String, String> {
    let options = parse_command_options(args, true)?;
    load_environment()?;
    let settings = load_settings(&options)?;
    let api_key = require_api_key()?;
    let mut controller = build_controller(&settings, api_key)?;

    let surface = if options.plain {
        ChatSurface::Plain
    } else {
        ChatSurface::Terminal
    };
    run_local_consultation(&mut controller, surface)
}
