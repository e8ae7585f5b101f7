//! Upstream conversion-service client
//!
//! Stateless request wrappers for the five operations the relay performs
//! against the conversion service: register, verify (the email link click),
//! login, upload, and convert. Each maps a non-success status to its own
//! failure kind so callers and operators can tell them apart.

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    Result,
    config::settings::UpstreamSettings,
    session::retry::{Attempt, poll_until},
    types::Identity,
};

/// Conversion-service API client
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    /// HTTP client
    client: Client,
    /// Base URL of the conversion API
    base_url: String,
    /// Pause between conversion readiness polls
    convert_poll_interval: Duration,
    /// Overall conversion poll budget
    convert_budget: Duration,
}

impl UpstreamClient {
    /// Create a new upstream client from the configured base URL and budgets
    pub fn new(client: Client, settings: &UpstreamSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.clone(),
            convert_poll_interval: Duration::from_millis(settings.convert_poll_interval_ms),
            convert_budget: Duration::from_secs(settings.convert_timeout_secs),
        }
    }

    /// Register a throwaway account.
    ///
    /// Any non-2xx response is
    /// [`Error::RegistrationFailed`](crate::Error::RegistrationFailed); the
    /// provisioning loop treats it as one spent attempt.
    pub async fn register(&self, identity: &Identity) -> Result<()> {
        let payload = serde_json::json!({
            "email": identity.email,
            "password": identity.password,
            "firstName": identity.first_name,
            "lastName": identity.last_name,
            "referredBy": "",
        });

        let response = self
            .client
            .post(format!("{}/register", self.base_url))
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(crate::Error::registration_failed(response.status().as_u16()));
        }

        info!("Registered disposable account {}", identity.email);
        Ok(())
    }

    /// "Click" the verification link: a plain fetch following redirects, body
    /// discarded.
    pub async fn click_verification(&self, link: &str) -> Result<()> {
        let response = self
            .client
            .get(link)
            .header("Accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| crate::Error::verification_click_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(crate::Error::verification_click_failed(format!(
                "status {}",
                response.status()
            )));
        }

        debug!(
            "Verification link accessed, final URL: {}, status: {}",
            response.url(),
            response.status()
        );
        Ok(())
    }

    /// Log in and return the bearer token.
    ///
    /// A response without a string `token` field is
    /// [`Error::LoginFailed`](crate::Error::LoginFailed).
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let payload = serde_json::json!({ "email": email, "password": password });

        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(crate::Error::login_failed(format!(
                "status {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await?;
        body.get("token")
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or_else(|| crate::Error::login_failed("token not found in response"))
    }

    /// Upload a statement PDF and return the upstream file handle (UUID).
    pub async fn upload(&self, token: &str, file_bytes: Vec<u8>, filename: &str) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| crate::Error::upload_failed(format!("invalid part: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("files", part);

        let response = self
            .client
            .post(format!("{}/BankStatement", self.base_url))
            .header("Authorization", token)
            .header("Accept", "application/json")
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(crate::Error::upload_failed(format!(
                "status {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response.json().await?;
        body.as_array()
            .and_then(|items| items.first())
            .and_then(|item| item.get("uuid"))
            .and_then(|uuid| uuid.as_str())
            .map(|uuid| uuid.to_string())
            .ok_or_else(|| {
                crate::Error::upload_failed(format!("UUID not found in response: {}", body))
            })
    }

    /// Convert an uploaded statement to CSV, polling until the upstream has
    /// processed the file.
    ///
    /// The upstream signals "not ready yet" with a 400; that tick is spent
    /// and the loop resubmits after the interval. Any other non-2xx status is
    /// [`Error::ConversionFailed`](crate::Error::ConversionFailed)
    /// immediately; network errors are transient within the budget.
    /// Exhausting the budget is
    /// [`Error::ConversionTimeout`](crate::Error::ConversionTimeout).
    pub async fn convert(&self, token: &str, uuid: &str) -> Result<String> {
        let interval_ms = self.convert_poll_interval.as_millis().max(1) as u64;
        let attempts = (self.convert_budget.as_millis() as u64 / interval_ms).max(1) as u32;

        let csv = poll_until(attempts, self.convert_poll_interval, |attempt| {
            self.convert_once(token, uuid, attempt, attempts)
        })
        .await?;

        match csv {
            Some(csv) => {
                info!("Conversion successful for {}", uuid);
                Ok(csv)
            }
            None => Err(crate::Error::conversion_timeout(
                self.convert_budget.as_secs(),
            )),
        }
    }

    async fn convert_once(
        &self,
        token: &str,
        uuid: &str,
        attempt: u32,
        attempts: u32,
    ) -> Result<Attempt<String>> {
        let response = self
            .client
            .post(format!("{}/BankStatement/convert?format=CSV", self.base_url))
            .header("Authorization", token)
            .header("Content-Type", "text/plain;charset=UTF-8")
            .header("Accept", "text/csv,*/*;q=0.8")
            .body(format!("[\"{}\"]", uuid))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Network error polling conversion for {}: {}", uuid, e);
                return Ok(Attempt::Pending);
            }
        };

        let status = response.status();
        if status.is_success() {
            Ok(Attempt::Ready(response.text().await?))
        } else if status == reqwest::StatusCode::BAD_REQUEST {
            debug!(
                "File {} not ready yet (attempt {}/{})",
                uuid, attempt, attempts
            );
            Ok(Attempt::Pending)
        } else {
            Err(crate::Error::conversion_failed(status.as_u16()))
        }
    }
}
