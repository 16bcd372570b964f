use super::{resolve_config_path, ConfigError, ConfigSource, Settings};
use crate::provider::OPENAI_API_KEY_ENV;
use std::path::Path;

pub fn load_settings(cli_override: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut settings = match resolve_config_path(cli_override) {
        ConfigSource::Explicit(path) => Settings::from_path(&path)?,
        ConfigSource::Default(path) if path.exists() => Settings::from_path(&path)?,
        ConfigSource::Default(_) => Settings::default(),
    };
    settings.apply_env_overrides();
    settings.validate()?;
    Ok(settings)
}

/// Loads `.env` from the working directory into the process environment.
/// A missing file is not an error; existing variables are not overridden.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::DotEnv(err.to_string())),
    }
}

pub fn load_api_key() -> Result<String, ConfigError> {
    std::env::var(OPENAI_API_KEY_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingCredential {
            key: OPENAI_API_KEY_ENV.to_string(),
        })
}
