//! Configuration loading integration tests
//!
//! Verifies the precedence chain (defaults < file < environment) and
//! validation at the loader level.

use statement_relay::{ConfigLoader, Settings};
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Environment-touching tests must not interleave
static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn defaults_match_the_documented_deployment() {
    let settings = Settings::default();

    assert_eq!(settings.session.max_usage, 5);
    assert_eq!(settings.session.max_registration_attempts, 5);
    assert_eq!(settings.upstream.convert_timeout_secs, 90);
    assert_eq!(settings.upstream.convert_poll_interval_ms, 3000);
    assert_eq!(settings.mailbox.poll_attempts, 15);
    assert_eq!(settings.mailbox.poll_interval_ms, 5000);
    assert!(settings.session.store_path.is_none());
    assert!(settings.validate().is_ok());
}

#[test]
fn file_overrides_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[server]
host = "127.0.0.1"
port = 9001

[session]
max_usage = 2
mail_domains = ["example.test"]

[upstream]
base_url = "http://127.0.0.1:9100/api/v1"

[mailbox]
base_url = "http://127.0.0.1:9101"
poll_attempts = 4
        "#
    )
    .unwrap();

    let settings = ConfigLoader::new().load(Some(temp_file.path())).unwrap();

    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 9001);
    assert_eq!(settings.session.max_usage, 2);
    assert_eq!(settings.session.mail_domains, vec!["example.test"]);
    assert_eq!(settings.upstream.base_url, "http://127.0.0.1:9100/api/v1");
    assert_eq!(settings.mailbox.poll_attempts, 4);
    // Untouched knobs keep defaults
    assert_eq!(settings.session.max_registration_attempts, 5);
}

#[test]
fn environment_overrides_file() {
    let _lock = ENV_TEST_MUTEX.lock().unwrap();

    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[session]
max_usage = 2
        "#
    )
    .unwrap();

    unsafe {
        std::env::set_var("MAX_USAGE", "11");
        std::env::set_var("SESSION_FILE", "/var/lib/relay/session.json");
    }

    let settings = ConfigLoader::new().load(Some(temp_file.path())).unwrap();
    assert_eq!(settings.session.max_usage, 11);
    assert_eq!(
        settings.session.store_path,
        Some(std::path::PathBuf::from("/var/lib/relay/session.json"))
    );

    unsafe {
        std::env::remove_var("MAX_USAGE");
        std::env::remove_var("SESSION_FILE");
    }
}

#[test]
fn invalid_file_values_fail_validation() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[session]
max_usage = 0
        "#
    )
    .unwrap();

    let result = ConfigLoader::new().load(Some(temp_file.path()));
    assert!(result.is_err());
}

#[test]
fn malformed_toml_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[session\nmax_usage = ").unwrap();
    temp_file.flush().unwrap();

    let result = ConfigLoader::new().load(Some(temp_file.path()));
    assert!(result.is_err());
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let settings = ConfigLoader::new()
        .load(Some(std::path::Path::new("/definitely/not/here.toml")))
        .unwrap();
    assert_eq!(settings.session.max_usage, 5);
}
