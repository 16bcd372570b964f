use super::ConfigError;
use crate::provider::DEFAULT_API_BASE;
use crate::transcript::TranscriptLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const API_BASE_ENV: &str = "TBIBKOM_API_BASE";

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f64 = 0.4;
pub const DEFAULT_TRANSCRIPTS_DIR: &str = "conversations";
pub const DEFAULT_LOG_FILE: &str = "logs/tbibkom.log";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_transcripts_dir() -> PathBuf {
    PathBuf::from(DEFAULT_TRANSCRIPTS_DIR)
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TranscriptSettings {
    #[serde(default = "default_transcripts_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub layout: TranscriptLayout,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            dir: default_transcripts_dir(),
            layout: TranscriptLayout::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub transcripts: TranscriptSettings,
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            api_base: default_api_base(),
            request_timeout_secs: None,
            transcripts: TranscriptSettings::default(),
            log_file: default_log_file(),
        }
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw, path)
    }

    pub fn from_yaml(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.display().to_string(),
            source,
        })
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(api_base) = std::env::var(API_BASE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            self.api_base = api_base;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Settings("`model` must be non-empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Settings(format!(
                "`temperature` must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(ConfigError::Settings(format!(
                "`api_base` must be an http(s) url, got `{}`",
                self.api_base
            )));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::Settings(
                "`request_timeout_secs` must be greater than zero when set".to_string(),
            ));
        }
        if self.transcripts.dir.as_os_str().is_empty() {
            return Err(ConfigError::Settings(
                "`transcripts.dir` must be non-empty".to_string(),
            ));
        }
        if self.log_file.as_os_str().is_empty() {
            return Err(ConfigError::Settings("`log_file` must be non-empty".to_string()));
        }
        Ok(())
    }
}
