//! Error formatting utilities
//!
//! Provides consistent error message formatting for log lines and the JSON
//! error bodies returned by the HTTP surface.

use crate::Error;
use std::error::Error as StdError;

/// Format error for display, walking nested causes
///
/// Most variants are self-describing through their `Display` impl; this adds
/// the underlying cause chain (e.g. the reqwest transport error behind an
/// `Http` variant) when it is not already part of the message.
pub fn format_error(error: &Error) -> String {
    let mut result = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        if !result.contains(&cause.to_string()) {
            result = format!("{} (caused by {})", result, cause);
        }
        source = cause.source();
    }

    result
}

/// Format error for JSON API responses
pub fn format_error_for_api(error: &Error) -> serde_json::Value {
    serde_json::json!({
        "error": format_error(error),
        "category": error.category(),
        "retryable": error.is_retryable(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })
}
