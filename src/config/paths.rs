use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE_NAME: &str = "tbibkom.yaml";
pub const CONFIG_PATH_ENV: &str = "TBIBKOM_CONFIG";

/// Where the settings file comes from. An explicit source must exist; the
/// implicit default may be absent, in which case built-in defaults apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Default(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(path) | Self::Default(path) => path,
        }
    }
}

/// `--config` wins, then `TBIBKOM_CONFIG`, then `tbibkom.yaml` in the
/// working directory.
pub fn resolve_config_path(cli_override: Option<&Path>) -> ConfigSource {
    if let Some(path) = cli_override {
        return ConfigSource::Explicit(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|v| !v.is_empty()) {
        return ConfigSource::Explicit(PathBuf::from(path));
    }
    ConfigSource::Default(PathBuf::from(DEFAULT_CONFIG_FILE_NAME))
}
