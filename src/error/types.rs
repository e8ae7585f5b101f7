//! Error taxonomy for the relay
//!
//! One variant per distinct failure kind so the caller-facing layer can map
//! each to its own service error instead of a single generic 500. Exhaustion
//! of a bounded retry budget always converts into one of the named variants
//! below; transient errors inside a budget are never surfaced individually.

use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Upstream rejected the disposable-account registration
    #[error("Registration failed with upstream status {status}")]
    RegistrationFailed {
        /// HTTP status the upstream returned
        status: u16,
    },

    /// The verification email never produced a usable link within the poll budget
    #[error("No verification link arrived within {waited_secs} seconds")]
    VerificationTimeout {
        /// Total seconds covered by the poll budget
        waited_secs: u64,
    },

    /// Fetching the verification link did not succeed
    #[error("Verification link fetch failed: {reason}")]
    VerificationClickFailed {
        /// Status or transport problem encountered
        reason: String,
    },

    /// Login did not yield a bearer token
    #[error("Login failed: {reason}")]
    LoginFailed {
        /// Why no token was obtained
        reason: String,
    },

    /// Every provisioning attempt failed
    #[error("Failed to provision a new session after {attempts} attempts")]
    ProvisioningExhausted {
        /// Number of attempts made before giving up
        attempts: u32,
    },

    /// Statement upload was rejected or returned no file handle
    #[error("Upload failed: {reason}")]
    UploadFailed {
        /// Why the upload produced no usable handle
        reason: String,
    },

    /// Conversion never became ready within the poll budget
    #[error("Conversion timed out after {duration_secs} seconds")]
    ConversionTimeout {
        /// Total seconds covered by the poll budget
        duration_secs: u64,
    },

    /// Upstream rejected the conversion outright
    #[error("Conversion failed with upstream status {status}")]
    ConversionFailed {
        /// HTTP status the upstream returned
        status: u16,
    },

    /// Backing session store is unreachable; fatal for every core operation
    #[error("Session store unavailable: {reason}")]
    StoreUnavailable {
        /// Underlying I/O problem
        reason: String,
    },

    /// Configuration errors
    #[error("Configuration error in {field}: {message}")]
    Config {
        /// The configuration field that has an error
        field: String,
        /// Error message describing the issue
        message: String,
    },

    /// Validation errors
    #[error("Validation failed for {field}: {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Error message describing the validation failure
        message: String,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal issue
        message: String,
    },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a registration failure from an upstream status
    pub fn registration_failed(status: u16) -> Self {
        Self::RegistrationFailed { status }
    }

    /// Create a verification timeout covering the given budget
    pub fn verification_timeout(waited_secs: u64) -> Self {
        Self::VerificationTimeout { waited_secs }
    }

    /// Create a verification-click failure
    pub fn verification_click_failed(reason: impl Into<String>) -> Self {
        Self::VerificationClickFailed {
            reason: reason.into(),
        }
    }

    /// Create a login failure
    pub fn login_failed(reason: impl Into<String>) -> Self {
        Self::LoginFailed {
            reason: reason.into(),
        }
    }

    /// Create a provisioning-exhausted failure
    pub fn provisioning_exhausted(attempts: u32) -> Self {
        Self::ProvisioningExhausted { attempts }
    }

    /// Create an upload failure
    pub fn upload_failed(reason: impl Into<String>) -> Self {
        Self::UploadFailed {
            reason: reason.into(),
        }
    }

    /// Create a conversion timeout covering the given budget
    pub fn conversion_timeout(duration_secs: u64) -> Self {
        Self::ConversionTimeout { duration_secs }
    }

    /// Create a conversion failure from an upstream status
    pub fn conversion_failed(status: u16) -> Self {
        Self::ConversionFailed { status }
    }

    /// Create a store-unavailable failure
    pub fn store_unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(field: S, message: S) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a retryable error
    ///
    /// Retryable here means "a fresh attempt against the same deployment may
    /// succeed"; the timeouts qualify because the upstream/mailbox may simply
    /// have been slow.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::VerificationTimeout { .. } => true,
            Error::ConversionTimeout { .. } => true,
            Error::ProvisioningExhausted { .. } => true,
            _ => false,
        }
    }

    /// Get error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            Error::Http(..) => "http",
            Error::Json(..) => "json",
            Error::Toml(..) => "toml",
            Error::Url(..) => "url",
            Error::Io(..) => "io",
            Error::RegistrationFailed { .. } => "registration",
            Error::VerificationTimeout { .. } => "verification",
            Error::VerificationClickFailed { .. } => "verification",
            Error::LoginFailed { .. } => "login",
            Error::ProvisioningExhausted { .. } => "provisioning",
            Error::UploadFailed { .. } => "upload",
            Error::ConversionTimeout { .. } => "conversion",
            Error::ConversionFailed { .. } => "conversion",
            Error::StoreUnavailable { .. } => "store",
            Error::Config { .. } => "config",
            Error::Validation { .. } => "validation",
            Error::Internal { .. } => "internal",
        }
    }
}
