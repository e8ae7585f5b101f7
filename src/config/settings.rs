//! Layered configuration
//!
//! Settings come from a TOML file, environment variables, and CLI overrides,
//! in increasing priority. Every knob the session lifecycle depends on (quota,
//! attempt budgets, poll intervals, API base URLs) lives here so tests can
//! point the relay at mock services and shrink the poll clocks.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// Helper functions for serde defaults
fn default_host() -> String {
    "::".to_string()
}

fn default_port() -> u16 {
    8279
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_true() -> bool {
    true
}

fn default_max_body_size() -> usize {
    20 * 1024 * 1024
}

fn default_max_usage() -> u32 {
    5
}

fn default_max_registration_attempts() -> u32 {
    5
}

fn default_provision_retry_interval() -> u64 {
    1000
}

fn default_mail_domains() -> Vec<String> {
    [
        "vwh.sh",
        "iusearch.lol",
        "barid.site",
        "z44d.pro",
        "wael.fun",
        "kuruptd.ink",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_upstream_base_url() -> String {
    "https://api2.bankstatementconverter.com/api/v1".to_string()
}

fn default_convert_poll_interval() -> u64 {
    3000
}

fn default_convert_timeout() -> u64 {
    90
}

fn default_mailbox_base_url() -> String {
    "https://api.barid.site".to_string()
}

fn default_mailbox_poll_interval() -> u64 {
    5000
}

fn default_mailbox_poll_attempts() -> u32 {
    15
}

fn default_request_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// Duration serialization module
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Main configuration settings for the relay
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Server configuration
    #[serde(default)]
    pub server: ServerSettings,
    /// Session lifecycle configuration
    #[serde(default)]
    pub session: SessionSettings,
    /// Upstream conversion-service configuration
    #[serde(default)]
    pub upstream: UpstreamSettings,
    /// Temp-mail provider configuration
    #[serde(default)]
    pub mailbox: MailboxSettings,
    /// Outbound HTTP client configuration
    #[serde(default)]
    pub network: NetworkSettings,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout duration
    #[serde(with = "duration_secs", default = "default_timeout")]
    pub timeout: Duration,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
    /// Maximum upload body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

/// Session lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Conversions permitted per token before forced reprovisioning
    #[serde(default = "default_max_usage")]
    pub max_usage: u32,
    /// Provisioning attempts before giving up
    #[serde(default = "default_max_registration_attempts")]
    pub max_registration_attempts: u32,
    /// Pause between provisioning attempts in milliseconds
    #[serde(default = "default_provision_retry_interval")]
    pub retry_interval_ms: u64,
    /// Session store file path; platform cache dir when unset
    #[serde(default)]
    pub store_path: Option<std::path::PathBuf>,
    /// Mailbox domains eligible for throwaway identities
    #[serde(default = "default_mail_domains")]
    pub mail_domains: Vec<String>,
}

/// Upstream conversion-service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamSettings {
    /// Conversion API base URL
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
    /// Pause between conversion readiness polls in milliseconds
    #[serde(default = "default_convert_poll_interval")]
    pub convert_poll_interval_ms: u64,
    /// Overall conversion poll budget in seconds
    #[serde(default = "default_convert_timeout")]
    pub convert_timeout_secs: u64,
}

/// Temp-mail provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxSettings {
    /// Mailbox API base URL
    #[serde(default = "default_mailbox_base_url")]
    pub base_url: String,
    /// Pause between inbox polls in milliseconds
    #[serde(default = "default_mailbox_poll_interval")]
    pub poll_interval_ms: u64,
    /// Inbox polls before the verification email is declared missing
    #[serde(default = "default_mailbox_poll_attempts")]
    pub poll_attempts: u32,
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSettings {
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    /// User agent string presented to the upstream and mailbox APIs
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable verbose logging
    #[serde(default)]
    pub verbose: bool,
    /// Enable request/response logging
    #[serde(default = "default_true")]
    pub log_requests: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout: default_timeout(),
            enable_cors: default_true(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_usage: default_max_usage(),
            max_registration_attempts: default_max_registration_attempts(),
            retry_interval_ms: default_provision_retry_interval(),
            store_path: None,
            mail_domains: default_mail_domains(),
        }
    }
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            convert_poll_interval_ms: default_convert_poll_interval(),
            convert_timeout_secs: default_convert_timeout(),
        }
    }
}

impl Default for MailboxSettings {
    fn default() -> Self {
        Self {
            base_url: default_mailbox_base_url(),
            poll_interval_ms: default_mailbox_poll_interval(),
            poll_attempts: default_mailbox_poll_attempts(),
        }
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            verbose: false,
            log_requests: default_true(),
        }
    }
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut settings = Self::default();

        if let Ok(host) = std::env::var("RELAY_SERVER_HOST") {
            settings.server.host = host;
        }

        if let Ok(port) = std::env::var("RELAY_SERVER_PORT") {
            settings.server.port = port
                .parse()
                .map_err(|e| crate::Error::config("port", &format!("Invalid port: {}", e)))?;
        }

        if let Ok(max_usage) = std::env::var("MAX_USAGE") {
            settings.session.max_usage = max_usage.parse().map_err(|e| {
                crate::Error::config("MAX_USAGE", &format!("Invalid quota: {}", e))
            })?;
        }

        if let Ok(attempts) = std::env::var("MAX_REGISTRATION_ATTEMPTS") {
            settings.session.max_registration_attempts = attempts.parse().map_err(|e| {
                crate::Error::config(
                    "MAX_REGISTRATION_ATTEMPTS",
                    &format!("Invalid attempt count: {}", e),
                )
            })?;
        }

        if let Ok(path) = std::env::var("SESSION_FILE") {
            settings.session.store_path = Some(std::path::PathBuf::from(path));
        }

        if let Ok(base) = std::env::var("UPSTREAM_API_BASE") {
            settings.upstream.base_url = base;
        }

        if let Ok(base) = std::env::var("MAILBOX_API_BASE") {
            settings.mailbox.base_url = base;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            settings.logging.level = level;
        }

        if let Ok(verbose) = std::env::var("VERBOSE") {
            settings.logging.verbose = verbose.parse().unwrap_or(false);
        }

        Ok(settings)
    }

    /// Load settings from configuration file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::config("file", &format!("Failed to read config file: {}", e))
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| {
            crate::Error::config("file", &format!("Failed to parse config file: {}", e))
        })?;

        Ok(settings)
    }

    /// Merge settings with environment variable overrides
    pub fn merge_with_env(mut self) -> crate::Result<Self> {
        let env_settings = Self::from_env()?;
        let defaults = Self::default();

        // Merge only non-default values from environment
        if env_settings.server.host != defaults.server.host {
            self.server.host = env_settings.server.host;
        }
        if env_settings.server.port != defaults.server.port {
            self.server.port = env_settings.server.port;
        }
        if env_settings.session.max_usage != defaults.session.max_usage {
            self.session.max_usage = env_settings.session.max_usage;
        }
        if env_settings.session.max_registration_attempts
            != defaults.session.max_registration_attempts
        {
            self.session.max_registration_attempts = env_settings.session.max_registration_attempts;
        }
        if env_settings.session.store_path.is_some() {
            self.session.store_path = env_settings.session.store_path;
        }
        if env_settings.upstream.base_url != defaults.upstream.base_url {
            self.upstream.base_url = env_settings.upstream.base_url;
        }
        if env_settings.mailbox.base_url != defaults.mailbox.base_url {
            self.mailbox.base_url = env_settings.mailbox.base_url;
        }
        if env_settings.logging.level != defaults.logging.level {
            self.logging.level = env_settings.logging.level;
        }

        Ok(self)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> crate::Result<()> {
        if self.server.port == 0 {
            return Err(crate::Error::config(
                "port",
                "Invalid server port: cannot be 0",
            ));
        }

        if self.session.max_usage == 0 {
            return Err(crate::Error::config(
                "max_usage",
                "Invalid usage quota: cannot be 0",
            ));
        }

        if self.session.max_registration_attempts == 0 {
            return Err(crate::Error::config(
                "max_registration_attempts",
                "Invalid attempt budget: cannot be 0",
            ));
        }

        if self.session.mail_domains.is_empty() {
            return Err(crate::Error::config(
                "mail_domains",
                "At least one mailbox domain is required",
            ));
        }

        if self.upstream.convert_poll_interval_ms == 0 {
            return Err(crate::Error::config(
                "convert_poll_interval_ms",
                "Invalid poll interval: cannot be 0",
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(crate::Error::config(
                    "log_level",
                    &format!("Invalid log level: {}", self.logging.level),
                ));
            }
        }

        for (name, base_url) in [
            ("upstream.base_url", &self.upstream.base_url),
            ("mailbox.base_url", &self.mailbox.base_url),
        ] {
            if let Err(e) = url::Url::parse(base_url) {
                return Err(crate::Error::config(
                    name,
                    &format!("Invalid base URL '{}': {}", base_url, e),
                ));
            }
        }

        Ok(())
    }
}
