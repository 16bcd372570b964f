use crate::config::{load_api_key, load_dotenv, load_settings as config_load_settings, Settings};
use crate::consultation::SessionController;
use crate::provider::{OpenAiConfig, OpenAiGateway};
use crate::shared::logging::EventLog;
use crate::transcript::TranscriptStore;
use std::path::PathBuf;
use std::time::Duration;

pub const MISSING_API_KEY_NOTICE: &str = "❌ Clé API OpenAI manquante dans .env";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOptions {
    pub plain: bool,
    pub config: Option<PathBuf>,
}

pub fn parse_command_options(args: &[String], allow_plain: bool) -> Result<CommandOptions, String> {
    let mut options = CommandOptions::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--plain" if allow_plain => options.plain = true,
            "--config" => {
                let value = args
                    .get(index + 1)
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(|| "--config requires a path".to_string())?;
                options.config = Some(PathBuf::from(value));
                index += 1;
            }
            other => return Err(format!("unexpected argument `{other}`")),
        }
        index += 1;
    }
    Ok(options)
}

pub fn load_settings(options: &CommandOptions) -> Result<Settings, String> {
    config_load_settings(options.config.as_deref()).map_err(|e| e.to_string())
}

/// Reads `./.env` so its values take part in settings overrides and the
/// credential lookup.
pub fn load_environment() -> Result<(), String> {
    load_dotenv().map_err(|e| e.to_string())
}

pub fn require_api_key() -> Result<String, String> {
    load_api_key().map_err(|e| format!("{MISSING_API_KEY_NOTICE} ({e})"))
}

pub fn openai_config(settings: &Settings, api_key: String) -> OpenAiConfig {
    OpenAiConfig {
        api_key,
        api_base: settings.api_base.clone(),
        model: settings.model.clone(),
        temperature: settings.temperature,
        timeout: settings.request_timeout_secs.map(Duration::from_secs),
    }
}

pub fn build_controller(
    settings: &Settings,
    api_key: String,
) -> Result<SessionController<OpenAiGateway>, String> {
    let gateway = OpenAiGateway::new(openai_config(settings, api_key)).map_err(|e| e.to_string())?;
    let store = TranscriptStore::new(&settings.transcripts.dir, settings.transcripts.layout);
    let log = EventLog::to_file(&settings.log_file);
    Ok(SessionController::new(gateway, store, log))
}
