//! Error types for Guru

use thiserror::Error;

/// Result type alias for Guru operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Guru
#[derive(Error, Debug)]
pub enum Error {
    /// Required input missing before a call was made
    #[error("{0}")]
    Validation(String),

    #[error("No API key configured. Run 'guru key set <KEY>' or 'guru onboard'.")]
    MissingCredential,

    /// Non-success HTTP status from the generation endpoint
    #[error("API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Success status, but the body could not be understood
    #[error("Invalid response from API: {0}")]
    InvalidResponseShape(String),

    /// Persistence failure. Logged by the core, never shown to the user.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error should reach the user as a notification.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Error::Storage(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_display_carries_message() {
        let err = Error::Upstream {
            status: 429,
            message: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "API error (429): quota exceeded");
    }

    #[test]
    fn test_storage_is_not_user_visible() {
        assert!(!Error::Storage("disk full".into()).is_user_visible());
        assert!(Error::MissingCredential.is_user_visible());
    }
}
