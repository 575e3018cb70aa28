use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClearcutError {
    #[error("IO error on {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {}: {message}", path.display())]
    DecodeError { path: PathBuf, message: String },

    #[error("Failed to encode {format} image: {message}")]
    EncodeError { format: String, message: String },

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Processing error: {message}")]
    ProcessingError { message: String },

    #[error("Background removal failed: {message}")]
    RemoverError { message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Codec,
    Remover,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ClearcutError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn decode(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::DecodeError {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn encode(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EncodeError {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn remover(message: impl Into<String>) -> Self {
        Self::RemoverError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::IoError { .. } => ErrorCategory::Io,
            Self::DecodeError { .. }
            | Self::EncodeError { .. }
            | Self::UnsupportedFormat(_)
            | Self::ProcessingError { .. } => ErrorCategory::Codec,
            Self::RemoverError { .. } | Self::HttpError(_) | Self::SerializationError(_) => {
                ErrorCategory::Remover
            }
            Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. }
            | Self::ValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 遠端服務暫時不可用，可以稍後重試
            Self::HttpError(e) if e.is_connect() || e.is_timeout() => ErrorSeverity::Medium,
            Self::RemoverError { .. } | Self::HttpError(_) | Self::SerializationError(_) => {
                ErrorSeverity::High
            }
            Self::DecodeError { .. } | Self::EncodeError { .. } | Self::UnsupportedFormat(_) => {
                ErrorSeverity::High
            }
            Self::IoError { .. } | Self::ProcessingError { .. } => ErrorSeverity::Critical,
            Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. }
            | Self::ValidationError { .. } => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::IoError { path, source } => match source.kind() {
                std::io::ErrorKind::NotFound => {
                    format!("Check that {} exists", path.display())
                }
                std::io::ErrorKind::PermissionDenied => {
                    format!("Check the permissions of {}", path.display())
                }
                _ => "Check the file paths and available disk space".to_string(),
            },
            Self::DecodeError { .. } => {
                "Make sure the source is a valid PNG, JPEG, GIF, BMP or WebP image".to_string()
            }
            Self::EncodeError { .. } => "Try a different export format".to_string(),
            Self::UnsupportedFormat(_) => "Use one of: png, jpg, webp".to_string(),
            Self::ProcessingError { .. } => "Retry the export; if it keeps failing, report a bug".to_string(),
            Self::RemoverError { .. } => {
                "Check that the background removal script and its model are installed".to_string()
            }
            Self::HttpError(_) => {
                "Check that the background removal backend is running and reachable".to_string()
            }
            Self::SerializationError(_) => {
                "The backend returned an unexpected response; check its version".to_string()
            }
            Self::MissingConfigError { field } => format!("Provide a value for {}", field),
            Self::InvalidConfigValueError { field, .. } => format!("Fix the value of {}", field),
            Self::ConfigValidationError { .. } => "Check the configuration file syntax".to_string(),
            Self::ValidationError { .. } => "Check the command line arguments".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("Could not read or write a file: {}", self),
            ErrorCategory::Codec => format!("Could not process the image: {}", self),
            ErrorCategory::Remover => format!("Background removal did not complete: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }

    /// 對應到程式結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClearcutError>;
