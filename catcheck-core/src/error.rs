//! Error types shared by the core library and the TUI

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by catcheck, grouped by layer.
///
/// Malformed change markup has no variant: the parser degrades silently.
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Infrastructure
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Backend
    // ─────────────────────────────────────────────────────────────
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("Backend returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Analysis stream error: {message}")]
    Stream { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Review
    // ─────────────────────────────────────────────────────────────
    #[error(transparent)]
    Review(#[from] crate::review::ReviewError),
}

impl Error {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Message suitable for a user-facing notification.
    ///
    /// Backend-reported failures carry a message written for end users, so it
    /// is shown as is; everything else keeps its full `Display` form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend { message } | Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_show_plain_message() {
        let err = Error::backend("Sheet not found");
        assert_eq!(err.user_message(), "Sheet not found");
        assert_eq!(err.to_string(), "Backend error: Sheet not found");
    }

    #[test]
    fn status_errors_show_backend_message() {
        let err = Error::Status {
            status: 404,
            message: "GPT response not found".into(),
        };
        assert_eq!(err.user_message(), "GPT response not found");
    }
}
