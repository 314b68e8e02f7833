use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Borrower not found: {identifier}")]
    NotFound { identifier: String },

    #[error("Ambiguous match for '{identifier}': rows {rows:?} all match")]
    AmbiguousMatch { identifier: String, rows: Vec<usize> },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Upstream error: {message}")]
    UpstreamError { message: String },

    #[error("Sheet '{sheet}' has no column matching '{column}'")]
    MissingColumn { sheet: String, column: String },

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// 對外回報的錯誤分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCategory {
    InvalidInput,
    NotFound,
    AmbiguousMatch,
    UpstreamError,
    ConfigurationError,
}

impl AppError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } | Self::UnknownAction(_) | Self::SerializationError(_) => {
                ErrorCategory::InvalidInput
            }
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::AmbiguousMatch { .. } => ErrorCategory::AmbiguousMatch,
            Self::ApiError(_)
            | Self::UpstreamError { .. }
            | Self::MissingColumn { .. }
            | Self::Timeout { .. } => ErrorCategory::UpstreamError,
            Self::IoError(_)
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::ConfigurationError,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::InvalidInput => 400,
            ErrorCategory::NotFound => 404,
            ErrorCategory::AmbiguousMatch => 409,
            ErrorCategory::UpstreamError => 502,
            ErrorCategory::ConfigurationError => 500,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::AmbiguousMatch { .. } => "Retry using the borrower's Unique ID instead of the name",
            Self::MissingColumn { .. } => "Check the header row of the spreadsheet tab",
            Self::Timeout { .. } | Self::ApiError(_) => {
                "Check network access to the Sheets API and retry"
            }
            Self::UpstreamError { .. } => "Check the service account's access to the spreadsheet",
            Self::MissingConfigError { .. } | Self::ConfigError { .. } => {
                "Set the missing value in the config file or environment"
            }
            Self::InvalidConfigValueError { .. } | Self::IoError(_) => {
                "Fix the configuration and restart"
            }
            Self::InvalidInput { .. } | Self::UnknownAction(_) | Self::SerializationError(_) => {
                "Correct the request and resend"
            }
            Self::NotFound { .. } => "Refresh the borrower list; the row may have been removed",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
