//! Failure message extraction.
//!
//! Priority: structured `detail` on the error body, then the transport
//! message, then the operation's fixed fallback. Blank strings are skipped
//! at every level.

use crate::error::HttpError;
use crate::types::ApiFailure;
use serde_json::Value;

/// Fallback for operations without a more specific one.
pub const DEFAULT_FALLBACK: &str = "An error occurred";

/// Render a `detail` value as text.
///
/// Validation errors arrive as a list of `{loc, msg, type}` entries; their
/// messages are joined.
fn detail_text(detail: &Value) -> Option<String> {
    let text = match detail {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let msgs: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => other.get("msg").and_then(Value::as_str).map(str::to_string),
                })
                .filter(|s| !s.trim().is_empty())
                .collect();
            if msgs.is_empty() {
                detail.to_string()
            } else {
                msgs.join("; ")
            }
        }
        other => other.to_string(),
    };
    Some(text).filter(|t| !t.trim().is_empty())
}

/// Pick the message shown to the user.
pub fn failure_message(detail: Option<&Value>, transport: Option<&str>, fallback: &str) -> String {
    detail
        .and_then(detail_text)
        .or_else(|| {
            transport
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| fallback.to_string())
}

impl ApiFailure {
    /// Normalize a dispatch error.
    pub fn from_error(error: &HttpError, fallback: &str) -> Self {
        let detail = error.detail();
        let transport = error.to_string();
        ApiFailure::new(failure_message(detail.as_ref(), Some(&transport), fallback))
    }
}
