pub mod error;
pub mod load;
pub mod paths;
pub mod settings;

pub use error::ConfigError;
pub use load::{load_api_key, load_dotenv, load_settings};
pub use paths::{
    resolve_config_path, ConfigSource, CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE_NAME,
};
pub use settings::{Settings, TranscriptSettings, API_BASE_ENV};
