//! Temp-mail inbox access and verification-link resolution
//!
//! The mailbox provider is the second external collaborator of the
//! provisioning workflow: after registering a throwaway account, the relay
//! polls the account's inbox until the upstream's confirmation email shows up
//! and yields its action link.
//!
//! The provider is a trait so tests can drive the resolver without HTTP;
//! [`MailboxClient`] is the shipped implementation against the temp-mail API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    Result,
    config::settings::MailboxSettings,
    session::extract,
    session::retry::{Attempt, poll_until},
};

/// Phrase the email subject must contain (case-insensitive)
pub const SUBJECT_MARKER: &str = "verify email";

/// One entry of an inbox listing
#[derive(Debug, Clone, Deserialize)]
pub struct MessageSummary {
    /// Provider-assigned message id
    pub id: String,
    /// Subject line; some providers omit it
    #[serde(default)]
    pub subject: String,
}

/// Trait for mailbox operations to enable testing with mocks
#[async_trait]
pub trait MailboxProvider {
    /// List the messages currently in the given mailbox
    async fn list_messages(&self, address: &str) -> Result<Vec<MessageSummary>>;

    /// Fetch a message's HTML body, `None` when the provider has no content
    async fn fetch_html_body(&self, message_id: &str) -> Result<Option<String>>;
}

/// Temp-mail API client
#[derive(Debug, Clone)]
pub struct MailboxClient {
    /// HTTP client
    client: Client,
    /// Base URL of the mailbox API
    base_url: String,
}

/// Inbox listing envelope: `{success, result: [...]}`
#[derive(Debug, Deserialize)]
struct ListEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: Vec<MessageSummary>,
}

/// Message fetch envelope: `{success, result: {html_content}}`
#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    #[serde(default)]
    success: bool,
    result: Option<MessageBody>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    html_content: Option<String>,
}

impl MailboxClient {
    /// Create a new mailbox client against the given API base URL
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn status_error(context: &str, status: reqwest::StatusCode) -> crate::Error {
        crate::Error::internal(format!("{} returned status {}", context, status))
    }
}

#[async_trait]
impl MailboxProvider for MailboxClient {
    async fn list_messages(&self, address: &str) -> Result<Vec<MessageSummary>> {
        let response = self
            .client
            .get(format!("{}/emails/{}", self.base_url, address))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error("inbox listing", response.status()));
        }

        let envelope: ListEnvelope = response.json().await?;
        if !envelope.success {
            return Ok(Vec::new());
        }
        Ok(envelope.result)
    }

    async fn fetch_html_body(&self, message_id: &str) -> Result<Option<String>> {
        let response = self
            .client
            .get(format!("{}/inbox/{}", self.base_url, message_id))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::status_error("message fetch", response.status()));
        }

        let envelope: MessageEnvelope = response.json().await?;
        if !envelope.success {
            return Ok(None);
        }
        Ok(envelope.result.and_then(|body| body.html_content))
    }
}

/// Polls an inbox until the confirmation email yields an action link.
///
/// Bounded by `poll_attempts` ticks of `poll_interval`. A network error
/// during a tick consumes that tick's attempt (logged, loop continues), so
/// the budget is a hard ceiling on elapsed time regardless of failure kind.
#[derive(Debug)]
pub struct VerificationResolver<M> {
    provider: M,
    poll_interval: Duration,
    poll_attempts: u32,
}

impl<M: MailboxProvider + Sync> VerificationResolver<M> {
    /// Create a resolver over the given provider with the configured budget
    pub fn new(provider: M, settings: &MailboxSettings) -> Self {
        Self {
            provider,
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            poll_attempts: settings.poll_attempts,
        }
    }

    /// Resolve the verification link for the given mailbox address.
    ///
    /// Returns the link from the first subject-matching message as soon as it
    /// appears. Exhausting the poll budget without a match is
    /// [`Error::VerificationTimeout`](crate::Error::VerificationTimeout) —
    /// distinguishing "not yet arrived" from other failure kinds.
    pub async fn resolve_verification_link(&self, address: &str) -> Result<String> {
        let link = poll_until(self.poll_attempts, self.poll_interval, |attempt| {
            self.poll_once(address, attempt)
        })
        .await?;

        match link {
            Some(link) => {
                info!("Verification link resolved for {}", address);
                Ok(link)
            }
            None => Err(crate::Error::verification_timeout(self.budget_secs())),
        }
    }

    /// Total seconds covered by the poll budget
    fn budget_secs(&self) -> u64 {
        self.poll_attempts as u64 * self.poll_interval.as_millis() as u64 / 1000
    }

    async fn poll_once(&self, address: &str, attempt: u32) -> Result<Attempt<String>> {
        let messages = match self.provider.list_messages(address).await {
            Ok(messages) => messages,
            Err(e) => {
                // Transient: the tick is spent, the budget keeps counting
                warn!(
                    "Error checking inbox (attempt {}/{}): {}",
                    attempt, self.poll_attempts, e
                );
                return Ok(Attempt::Pending);
            }
        };

        let Some(message) = messages
            .iter()
            .find(|m| m.subject.to_lowercase().contains(SUBJECT_MARKER))
        else {
            debug!(
                "Verification email not found yet (attempt {}/{})",
                attempt, self.poll_attempts
            );
            return Ok(Attempt::Pending);
        };

        match self.provider.fetch_html_body(&message.id).await {
            Ok(Some(html)) => match extract::verification_link_from_html(&html) {
                Some(link) => Ok(Attempt::Ready(link)),
                None => {
                    warn!("Message {} matched but carries no action link", message.id);
                    Ok(Attempt::Pending)
                }
            },
            Ok(None) => {
                warn!("Message {} has no HTML body yet", message.id);
                Ok(Attempt::Pending)
            }
            Err(e) => {
                warn!("Error reading message {}: {}", message.id, e);
                Ok(Attempt::Pending)
            }
        }
    }
}
