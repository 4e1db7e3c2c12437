pub mod app_config;

pub use app_config::{AppConfig, ConfigError, CONFIG_FILE_NAME, DEFAULT_FILE_RETRY_SECS};
