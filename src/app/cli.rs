#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Chat,
    Doctor,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "chat" => CliVerb::Chat,
        "doctor" => CliVerb::Doctor,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn cli_help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  chat [--plain] [--config <path>]     Start a consultation (terminal UI, or line mode with --plain)"
            .to_string(),
        "  doctor [--config <path>]             Check credential, config and transcript directory"
            .to_string(),
        "  help                                 Show this help".to_string(),
        String::new(),
        "Environment:".to_string(),
        "  OPENAI_API_KEY                       Required model-provider credential (.env is read)"
            .to_string(),
        "  TBIBKOM_CONFIG                       Settings file (default ./tbibkom.yaml)".to_string(),
        "  TBIBKOM_API_BASE                     Override the completion endpoint base url"
            .to_string(),
    ]
}

pub fn help_text() -> String {
    cli_help_lines().join("\n")
}
