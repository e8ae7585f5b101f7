//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests: mock upstream
//! and mailbox services, fast-poll settings, and session store fixtures.

#![allow(dead_code)]

use serde_json::json;
use statement_relay::{Settings, store::FileStore, types::Session};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A pair of mock services standing in for the conversion API and the
/// temp-mail API, plus a temp dir holding the session store
pub struct TestHarness {
    pub upstream: MockServer,
    pub mailbox: MockServer,
    pub store_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Start both mock services
    pub async fn start() -> Self {
        Self {
            upstream: MockServer::start().await,
            mailbox: MockServer::start().await,
            store_dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Settings pointing at the mocks, with millisecond poll clocks so
    /// budget-exhaustion tests finish quickly
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.upstream.base_url = self.upstream.uri();
        settings.upstream.convert_poll_interval_ms = 1;
        settings.upstream.convert_timeout_secs = 1;
        settings.mailbox.base_url = self.mailbox.uri();
        settings.mailbox.poll_interval_ms = 1;
        settings.mailbox.poll_attempts = 3;
        settings.session.retry_interval_ms = 0;
        settings.session.max_registration_attempts = 3;
        settings.session.store_path = Some(self.store_dir.path().join("session.json"));
        settings
    }

    /// Direct handle on the session store file backing the settings
    pub fn store(&self) -> FileStore {
        FileStore::new(self.store_dir.path().join("session.json"))
    }

    /// Seed the persisted session
    pub async fn seed_session(&self, token: &str, usage_count: u32) {
        use statement_relay::store::SessionStore;
        self.store()
            .save(&Session {
                token: Some(token.to_string()),
                usage_count,
            })
            .await
            .unwrap();
    }

    /// Mount the full happy-path provisioning conversation: registration
    /// succeeds, the inbox holds a verification email linking back to the
    /// upstream, the click succeeds, and login yields `token`
    pub async fn mount_provisioning(&self, token: &str) {
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.upstream)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/emails/.+"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "result": [{"id": "m1", "subject": "Please verify email"}]
            })))
            .mount(&self.mailbox)
            .await;

        let verify_url = format!("{}/account/verify?code=1", self.upstream.uri());
        Mock::given(method("GET"))
            .and(path("/inbox/m1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "result": {"html_content": format!("<a href=\"{verify_url}\">Verify my Email</a>")}
            })))
            .mount(&self.mailbox)
            .await;

        Mock::given(method("GET"))
            .and(path("/account/verify"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.upstream)
            .await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": token})))
            .mount(&self.upstream)
            .await;
    }

    /// Mount the upload + convert happy path
    pub async fn mount_conversion(&self, uuid: &str, csv: &str) {
        Mock::given(method("POST"))
            .and(path("/BankStatement"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"uuid": uuid}])))
            .mount(&self.upstream)
            .await;

        Mock::given(method("POST"))
            .and(path("/BankStatement/convert"))
            .respond_with(ResponseTemplate::new(200).set_body_string(csv))
            .mount(&self.upstream)
            .await;
    }

    /// Forbid any provisioning traffic; mounting these makes a provisioning
    /// attempt fail the test at verification time
    pub async fn forbid_provisioning(&self) {
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&self.upstream)
            .await;
    }
}

/// Build a multipart request body carrying one file field
pub fn multipart_body(field_name: &str, filename: &str, content: &[u8]) -> (String, Vec<u8>) {
    let boundary = "ReLaYtEsTbOuNdArY";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field_name}\"; \
             filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    (
        format!("multipart/form-data; boundary={boundary}"),
        body,
    )
}
