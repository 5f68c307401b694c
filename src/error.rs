// src/error.rs

//! Unified error handling for the notice watcher.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Every route failed for a target
    #[error("Fetch failed for {url} after {attempts} attempts")]
    Fetch { url: String, attempts: usize },

    /// Stored checkpoint could not be interpreted
    #[error("Checkpoint error at {path}: {message}")]
    Checkpoint { path: String, message: String },

    /// Notification was rejected or could not be sent
    #[error("Notify error: {0}")]
    Notify(String),

    /// Frontier discovery found nothing
    #[error("Bootstrap error: {0}")]
    Bootstrap(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a checkpoint error for the given location.
    pub fn checkpoint(path: impl AsRef<Path>, message: impl fmt::Display) -> Self {
        Self::Checkpoint {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a notification error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }

    /// Create a bootstrap error.
    pub fn bootstrap(message: impl Into<String>) -> Self {
        Self::Bootstrap(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message() {
        let err = AppError::Fetch {
            url: "https://example.com/?id=1".to_string(),
            attempts: 6,
        };
        assert_eq!(
            err.to_string(),
            "Fetch failed for https://example.com/?id=1 after 6 attempts"
        );
    }

    #[test]
    fn test_checkpoint_error_includes_path() {
        let err = AppError::checkpoint("storage/last_id.txt", "not an integer");
        assert!(err.to_string().contains("storage/last_id.txt"));
        assert!(err.to_string().contains("not an integer"));
    }
}
