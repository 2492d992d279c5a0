//! Error types for session operations.

use thiserror::Error;

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Client storage is not available in the server context")]
    NoClientStorage,

    #[error("SSO error: {0}")]
    Sso(String),

    #[error("Navigation error: {0}")]
    Navigation(String),
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        SessionError::Sso(err.to_string())
    }
}
