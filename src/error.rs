// Crate-wide error type.
// - Splits user input mistakes from external tool failures and filesystem problems.
// - Converts io/json errors with `?` so store and dispatcher code stays flat.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid TikTok URL: {0}")]
    InvalidUrl(String),

    #[error("external tool is missing: {tool}")]
    ToolMissing { tool: String },

    #[error("external tool failed: {tool} (code={code:?}) {stderr}")]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("stopped by user")]
    Cancelled,

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("invalid setting {key}: {message}")]
    InvalidSetting { key: String, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

const STATUS_MESSAGE_MAX_CHARS: usize = 120;

/// Shortens an error message so it fits on the status line.
pub fn truncate_message(message: &str) -> String {
    let message = message.trim();
    if message.chars().count() <= STATUS_MESSAGE_MAX_CHARS {
        return message.to_string();
    }

    let mut short = message
        .chars()
        .take(STATUS_MESSAGE_MAX_CHARS - 3)
        .collect::<String>();
    short.push_str("...");
    short
}
