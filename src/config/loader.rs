//! Configuration loading utilities
//!
//! Provides helper functions for loading configuration from various sources
//! with proper error handling and validation.

use crate::{Result, config::Settings};
use std::path::Path;
use tracing::{debug, info, warn};

/// Configuration loader with multiple source support
#[derive(Debug)]
pub struct ConfigLoader {
    /// Default settings
    defaults: Settings,
}

impl ConfigLoader {
    /// Create new configuration loader
    pub fn new() -> Self {
        Self {
            defaults: Settings::default(),
        }
    }

    /// Get the config file path from RELAY_CONFIG environment variable or default location
    ///
    /// Priority:
    /// 1. RELAY_CONFIG environment variable
    /// 2. ~/.config/statement-relay/config.toml (or platform equivalent)
    pub fn get_config_path() -> Option<std::path::PathBuf> {
        if let Ok(config_path) = std::env::var("RELAY_CONFIG") {
            let path = std::path::PathBuf::from(config_path);
            if path.exists() {
                debug!("Using config file from RELAY_CONFIG: {:?}", path);
                return Some(path);
            } else {
                warn!("RELAY_CONFIG points to non-existent file: {:?}", path);
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let default_path = config_dir.join("statement-relay").join("config.toml");
            if default_path.exists() {
                debug!("Using default config file: {:?}", default_path);
                return Some(default_path);
            }
        }

        debug!("No config file found");
        None
    }

    /// Load configuration with precedence order:
    /// 1. Command line arguments (highest priority, applied by the caller)
    /// 2. Environment variables
    /// 3. Configuration file
    /// 4. Default values (lowest priority)
    pub fn load(&self, config_file: Option<&Path>) -> Result<Settings> {
        let mut settings = self.defaults.clone();

        if let Some(path) = config_file {
            if path.exists() {
                info!("Loading configuration from file: {:?}", path);
                settings = Settings::from_file(path)?;
            } else {
                warn!("Configuration file not found: {:?}, using defaults", path);
            }
        }

        debug!("Applying environment variable overrides");
        settings = settings.merge_with_env()?;

        settings.validate()?;

        info!("Configuration loaded successfully");
        Ok(settings)
    }

    /// Get default configuration
    pub fn defaults(&self) -> &Settings {
        &self.defaults
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Static mutex to ensure environment variable tests don't interfere with each other
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_load_defaults() {
        let loader = ConfigLoader::new();
        let settings = loader.load(None).unwrap();
        assert_eq!(settings.server.port, loader.defaults().server.port);
        assert_eq!(settings.session.max_usage, 5);
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[session]
max_usage = 3
max_registration_attempts = 2
        "#
        )
        .unwrap();

        let loader = ConfigLoader::new();
        let settings = loader.load(Some(temp_file.path())).unwrap();
        assert_eq!(settings.session.max_usage, 3);
        assert_eq!(settings.session.max_registration_attempts, 2);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let loader = ConfigLoader::new();
        let settings = loader
            .load(Some(Path::new("/nonexistent/config.toml")))
            .unwrap();
        assert_eq!(settings.session.max_usage, 5);
    }

    #[test]
    fn test_invalid_file_content_is_an_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"invalid toml content [[[").unwrap();
        temp_file.flush().unwrap();

        let loader = ConfigLoader::new();
        assert!(loader.load(Some(temp_file.path())).is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let _lock = ENV_TEST_MUTEX.lock().unwrap();

        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[session]
max_registration_attempts = 3
        "#
        )
        .unwrap();

        unsafe {
            std::env::set_var("MAX_REGISTRATION_ATTEMPTS", "7");
        }

        let loader = ConfigLoader::new();
        let settings = loader.load(Some(temp_file.path())).unwrap();
        assert_eq!(settings.session.max_registration_attempts, 7);

        unsafe {
            std::env::remove_var("MAX_REGISTRATION_ATTEMPTS");
        }
    }

    #[test]
    fn test_get_config_path_with_env() {
        let _lock = ENV_TEST_MUTEX.lock().unwrap();

        let temp_file = NamedTempFile::new().unwrap();
        unsafe {
            std::env::set_var("RELAY_CONFIG", temp_file.path().to_str().unwrap());
        }

        let path = ConfigLoader::get_config_path();
        assert_eq!(path.as_deref(), Some(temp_file.path()));

        unsafe {
            std::env::remove_var("RELAY_CONFIG");
        }
    }
}
