use std::path::PathBuf;

use crate::config::ConfigError;
use crate::monitoring::heartbeat::DecodeError;

/// 애플리케이션 전역 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no directories found in {}", .0.display())]
    NoDirectoriesFound(PathBuf),

    #[error("no files found in {}", .0.display())]
    NoFilesFound(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log record decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("notification failed: {0}")]
    Notification(String),
}

impl AppError {
    /// 에러 코드 반환
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG001",
            AppError::NoDirectoriesFound(_) => "LOCATE001",
            AppError::NoFilesFound(_) => "LOCATE002",
            AppError::Io { .. } => "IO001",
            AppError::Decode(_) => "DECODE001",
            AppError::Notification(_) => "NOTIFY001",
        }
    }
}

/// 편의 함수들
impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn notification(msg: impl Into<String>) -> Self {
        AppError::Notification(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_variants_to_error_codes() {
        assert_eq!(
            AppError::NoDirectoriesFound(PathBuf::from("/logs")).error_code(),
            "LOCATE001"
        );
        assert_eq!(
            AppError::NoFilesFound(PathBuf::from("/logs/2024-01-01")).error_code(),
            "LOCATE002"
        );
        assert_eq!(AppError::notification("boom").error_code(), "NOTIFY001");
    }

    #[test]
    fn should_convert_decode_and_config_errors() {
        // Act
        let decode = AppError::from(DecodeError::WrongLength(1));
        let config = AppError::from(ConfigError::InvalidInterval);

        // Assert
        assert_eq!(decode.error_code(), "DECODE001");
        assert_eq!(
            decode.to_string(),
            "log record decode failed: expected a 2-element array, got 1 elements"
        );
        assert_eq!(config.error_code(), "CONFIG001");
    }

    #[test]
    fn should_include_path_in_message() {
        // Arrange
        let err = AppError::NoFilesFound(PathBuf::from("/var/log/hl/20240102"));

        // Act
        let message = err.to_string();

        // Assert
        assert_eq!(message, "no files found in /var/log/hl/20240102");
    }
}
