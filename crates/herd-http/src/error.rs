//! Error types for herd API dispatch.

use thiserror::Error;

/// Result type for herd HTTP operations.
pub type Result<T> = std::result::Result<T, HttpError>;

/// Errors that can occur while dispatching a request.
///
/// None of these cross the dispatcher boundary: [`crate::ApiClient`] turns
/// every one of them into an [`crate::ApiFailure`] message.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// The request never produced a response (DNS, connect, TLS, body read).
    #[error("{0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("[{method}] \"{url}\": {}", status_line(.status))]
    Status {
        method: String,
        url: String,
        status: u16,
        body: bytes::Bytes,
    },

    #[error("Missing path parameter: {0}")]
    MissingPathParam(String),

    #[error("Invalid multipart body: {0}")]
    Multipart(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn status_line(status: &u16) -> String {
    match http::StatusCode::from_u16(*status)
        .ok()
        .and_then(|s| s.canonical_reason())
    {
        Some(reason) => format!("{} {}", status, reason),
        None => status.to_string(),
    }
}

impl HttpError {
    /// The `detail` field of a structured error body, if the server sent one.
    pub fn detail(&self) -> Option<serde_json::Value> {
        match self {
            HttpError::Status { body, .. } => serde_json::from_slice::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("detail").cloned()),
            _ => None,
        }
    }
}
