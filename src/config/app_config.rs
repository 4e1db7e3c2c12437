use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::monitoring::AlertThresholds;

/// Configuration file read from the working directory at startup
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Fallback delay after a failed log file open
pub const DEFAULT_FILE_RETRY_SECS: u64 = 30;

/// 애플리케이션 설정
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    // Chat alert destination
    #[serde(default)]
    pub slack_token: String,
    #[serde(default)]
    pub slack_channel: String,

    // Paging service routing key
    #[serde(default)]
    pub pagerduty_api_key: String,

    /// Directory holding one subdirectory per day of validator logs
    pub base_path: PathBuf,
    pub validator_address: String,
    /// Poll interval in seconds
    pub check_interval: u64,

    #[serde(default = "default_file_retry_secs")]
    pub file_retry_secs: u64,

    /// Re-run the latest-file lookup on every cycle instead of only at startup
    #[serde(default)]
    pub relocate_each_cycle: bool,

    #[serde(default)]
    pub thresholds: AlertThresholds,
}

fn default_file_retry_secs() -> u64 {
    DEFAULT_FILE_RETRY_SECS
}

impl AppConfig {
    /// `config.toml`을 현재 디렉토리에서 로드
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_file(CONFIG_FILE_NAME)
    }

    /// 지정된 경로의 TOML 파일에서 설정 로드
    ///
    /// `.env` 및 환경 변수의 `SLACK_TOKEN`, `PAGERDUTY_API_KEY`가 파일 값을 덮어씁니다.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config = Self::from_toml_str(&content)?;

        dotenvy::dotenv().ok();
        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse without touching the environment or validating
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(token) = env::var("SLACK_TOKEN") {
            self.slack_token = token;
        }
        if let Ok(key) = env::var("PAGERDUTY_API_KEY") {
            self.pagerduty_api_key = key;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        if self.validator_address.trim().is_empty() {
            return Err(ConfigError::MissingField("validator_address"));
        }
        if self.base_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("base_path"));
        }

        if self.slack_token.is_empty() || self.slack_channel.is_empty() {
            tracing::warn!("Slack 설정이 비어 있습니다. 채팅 알림이 비활성화됩니다.");
        }
        if self.pagerduty_api_key.is_empty() {
            tracing::warn!("pagerduty_api_key가 비어 있습니다. 페이징 알림이 비활성화됩니다.");
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {0}")]
    Parse(#[source] toml::de::Error),
    #[error("check_interval must be greater than zero")]
    InvalidInterval,
    #[error("{0} is required")]
    MissingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;
    use uuid::Uuid;

    const MINIMAL: &str = r##"
        slack_token = "xoxb-test"
        slack_channel = "#validator-alerts"
        pagerduty_api_key = "routing-key"
        pagerduty_service_id = "PXXXXXX"
        base_path = "/var/log/hl/node_logs/status"
        validator_address = "0xabc"
        check_interval = 10
    "##;

    #[test]
    fn should_parse_minimal_config_with_defaults() {
        // Act
        let config = AppConfig::from_toml_str(MINIMAL).expect("config should parse");

        // Assert
        assert_eq!(config.slack_channel, "#validator-alerts");
        assert_eq!(config.pagerduty_api_key, "routing-key");
        assert_eq!(config.base_path, PathBuf::from("/var/log/hl/node_logs/status"));
        assert_eq!(config.validator_address, "0xabc");
        assert_eq!(config.check_interval, 10);
        assert_eq!(config.file_retry_secs, DEFAULT_FILE_RETRY_SECS);
        assert!(!config.relocate_each_cycle);
        assert_eq!(config.thresholds, AlertThresholds::default());
    }

    #[test]
    fn should_parse_custom_thresholds() {
        // Arrange
        let content = format!(
            "{}\nrelocate_each_cycle = true\n[thresholds]\nmax_since_last_success = 60.0\n",
            MINIMAL
        );

        // Act
        let config = AppConfig::from_toml_str(&content).expect("config should parse");

        // Assert
        assert!(config.relocate_each_cycle);
        assert_eq!(config.thresholds.max_since_last_success, 60.0);
        assert_eq!(config.thresholds.max_last_ack_duration, 0.02);
    }

    #[test]
    fn should_reject_zero_interval() {
        // Arrange
        let content = MINIMAL.replace("check_interval = 10", "check_interval = 0");
        let config = AppConfig::from_toml_str(&content).expect("config should parse");

        // Act
        let result = config.validate();

        // Assert
        assert!(matches!(result, Err(ConfigError::InvalidInterval)));
    }

    #[test]
    fn should_reject_empty_validator_address() {
        // Arrange
        let content = MINIMAL.replace("\"0xabc\"", "\"  \"");
        let config = AppConfig::from_toml_str(&content).expect("config should parse");

        // Act & Assert
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField("validator_address"))
        ));
    }

    #[test]
    fn should_fail_on_missing_required_key() {
        // Arrange
        let content = MINIMAL.replace("check_interval = 10", "");

        // Act
        let result = AppConfig::from_toml_str(&content);

        // Assert
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn should_fail_when_file_is_missing() {
        // Arrange
        let path = temp_dir().join(format!("missing_{}.toml", Uuid::new_v4()));

        // Act
        let result = AppConfig::from_file(&path);

        // Assert
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn should_load_config_from_file() {
        // Arrange
        let path = temp_dir().join(format!("config_{}.toml", Uuid::new_v4()));
        std::fs::write(&path, MINIMAL).expect("Failed to write config");

        // Act
        let result = AppConfig::from_file(&path);

        // Assert
        let config = result.expect("config should load");
        assert_eq!(config.validator_address, "0xabc");

        std::fs::remove_file(&path).ok();
    }
}
