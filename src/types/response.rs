//! Response type definitions
//!
//! Defines the structures returned by the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Session;

/// Ping response for health checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    /// Server uptime in seconds
    pub server_uptime: u64,

    /// Server version
    pub version: String,
}

impl PingResponse {
    /// Create a new ping response
    pub fn new(server_uptime: u64, version: impl Into<String>) -> Self {
        Self {
            server_uptime,
            version: version.into(),
        }
    }
}

/// Session quota snapshot for the debug endpoint.
///
/// Deliberately does not carry the token itself; operators only need to see
/// whether one is held and how much quota is left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatusResponse {
    /// Whether a bearer token is currently held
    pub has_token: bool,

    /// Conversions charged against the current token
    pub usage_count: u32,

    /// Conversions left before reprovisioning is forced
    pub remaining: u32,
}

impl SessionStatusResponse {
    /// Build a status snapshot from a session under the given quota
    pub fn from_session(session: &Session, max_usage: u32) -> Self {
        Self {
            has_token: session.token.as_deref().is_some_and(|t| !t.is_empty()),
            usage_count: session.usage_count,
            remaining: session.remaining(max_usage),
        }
    }
}

/// Error response for API errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Optional error context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Error timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Service version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            context: None,
            timestamp: Some(Utc::now()),
            version: Some(crate::utils::version::get_version().to_string()),
        }
    }

    /// Create error response with context
    pub fn with_context(error: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            context: Some(context.into()),
            timestamp: Some(Utc::now()),
            version: Some(crate::utils::version::get_version().to_string()),
        }
    }
}
