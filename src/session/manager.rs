//! # Session Management Module
//!
//! The core of the relay: decides whether the persisted bearer token is still
//! usable, drives the account-provisioning workflow when it is not, and
//! charges usage against the token after each successful conversion.
//!
//! ## Architecture
//!
//! The [`SessionManager`] orchestrates four collaborators:
//! - the [`SessionStore`] holding the `{token, usage_count}` record
//! - the credential generator ([`Identity::generate`])
//! - the [`VerificationResolver`] polling the throwaway inbox
//! - the [`UpstreamClient`] for register / verify / login
//!
//! ## Provisioning workflow
//!
//! register → poll inbox → extract link → click link → login, as one attempt
//! inside a bounded retry loop. Attempts are independent: any step failure is
//! logged and consumes the attempt, and nothing partial is ever persisted —
//! the prior session stays authoritative until a full replacement is written.
//!
//! ## Consistency model
//!
//! One async mutex serializes every load→decide→(provision)→save sequence,
//! so counting is exact and at most one provisioning runs per process. The
//! lock is deliberately held across provisioning: concurrent callers wait for
//! the in-flight attempt instead of racing to create redundant upstream
//! accounts. There is no cross-process protection — run one relay instance
//! per store path.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::{
    Result,
    config::Settings,
    error::format_error,
    session::mailbox::{MailboxClient, MailboxProvider, VerificationResolver},
    session::retry::{Attempt, poll_until},
    session::upstream::UpstreamClient,
    store::{FileStore, SessionStore, default_store_path},
    types::{Identity, Session},
};

/// Convenience type alias for the manager with the shipped store and mailbox
pub type SessionManager = SessionManagerGeneric<FileStore, MailboxClient>;

/// Session lifecycle manager, generic over the store and mailbox seams
#[derive(Debug)]
pub struct SessionManagerGeneric<S, M> {
    /// Configuration settings
    settings: Arc<Settings>,
    /// Durable session record
    store: S,
    /// Conversion-service client
    upstream: UpstreamClient,
    /// Inbox poller for verification links
    resolver: VerificationResolver<M>,
    /// Serializes every load→decide→save sequence (see module docs)
    state_lock: Mutex<()>,
}

/// Build the shared outbound HTTP client from network settings.
///
/// Redirects are followed with reqwest's default policy, which the
/// verification-link click relies on.
pub fn build_http_client(settings: &Settings) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(settings.network.user_agent.clone())
        .timeout(Duration::from_secs(settings.network.request_timeout))
        .connect_timeout(Duration::from_secs(settings.network.connect_timeout))
        .build()
        .expect("Failed to create HTTP client")
}

impl SessionManager {
    /// Creates a new session manager with the given configuration.
    ///
    /// Wires up the shared HTTP client, the file-backed session store (path
    /// from settings or the platform default), the mailbox client, and the
    /// upstream client.
    pub fn new(settings: Settings) -> Self {
        let client = build_http_client(&settings);

        let store_path = settings
            .session
            .store_path
            .clone()
            .unwrap_or_else(default_store_path);
        let store = FileStore::new(store_path);
        let mailbox = MailboxClient::new(client.clone(), settings.mailbox.base_url.clone());

        Self::with_parts(settings, store, mailbox, client)
    }
}

impl<S, M> SessionManagerGeneric<S, M>
where
    S: SessionStore,
    M: MailboxProvider + Send + Sync,
{
    /// Create a manager over explicit store and mailbox implementations.
    ///
    /// The seam used by tests (mock providers, failing stores) and by anyone
    /// embedding the core with a different persistence medium.
    pub fn with_parts(settings: Settings, store: S, mailbox: M, client: reqwest::Client) -> Self {
        let upstream = UpstreamClient::new(client, &settings.upstream);
        let resolver = VerificationResolver::new(mailbox, &settings.mailbox);

        Self {
            settings: Arc::new(settings),
            store,
            upstream,
            resolver,
            state_lock: Mutex::new(()),
        }
    }

    /// A clone of the upstream client, for the request-handling layer's
    /// upload/convert calls
    pub fn upstream_client(&self) -> UpstreamClient {
        self.upstream.clone()
    }

    /// The configured per-token conversion quota
    pub fn max_usage(&self) -> u32 {
        self.settings.session.max_usage
    }

    /// Returns a currently-valid bearer token, provisioning a fresh
    /// disposable account if the stored one is absent or exhausted.
    ///
    /// The returned token is never at or above quota. On provisioning
    /// failure the prior session (if any) remains authoritative — nothing
    /// partial is persisted.
    ///
    /// # Errors
    ///
    /// [`Error::StoreUnavailable`](crate::Error::StoreUnavailable) if the
    /// store cannot be read or written (surfaced before any provisioning is
    /// attempted), or
    /// [`Error::ProvisioningExhausted`](crate::Error::ProvisioningExhausted)
    /// when every provisioning attempt failed.
    pub async fn get_valid_token(&self) -> Result<String> {
        let _guard = self.state_lock.lock().await;

        let session = self.store.load().await?;
        let max_usage = self.settings.session.max_usage;
        let usage_count = session.usage_count;

        if session.is_usable(max_usage)
            && let Some(token) = session.token
        {
            debug!(
                "Token still fresh ({}/{} conversions used), reusing",
                usage_count, max_usage
            );
            return Ok(token);
        }

        info!("Session token absent or exhausted, provisioning a new account");
        let fresh = self.provision_session().await?;
        self.store.save(&fresh).await?;
        info!("New session provisioned and saved");

        fresh
            .token
            .ok_or_else(|| crate::Error::internal("provisioned session carries no token"))
    }

    /// Charge one conversion against the current token.
    ///
    /// Call exactly once per successful conversion, after the result is known
    /// good and before it is handed back to the caller. A crash after the
    /// save means "usage charged but result possibly lost" — accepted over
    /// the reverse, which would hand out free conversions.
    pub async fn record_usage(&self) -> Result<u32> {
        let _guard = self.state_lock.lock().await;

        let mut session = self.store.load().await?;
        session.charge();
        self.store.save(&session).await?;

        info!(
            "Token usage updated to {}/{}",
            session.usage_count, self.settings.session.max_usage
        );
        Ok(session.usage_count)
    }

    /// Snapshot of the current session for the debug endpoint
    pub async fn session_status(&self) -> Result<Session> {
        let _guard = self.state_lock.lock().await;
        self.store.load().await
    }

    /// Discard the current session, forcing provisioning on next use
    pub async fn invalidate_session(&self) -> Result<()> {
        let _guard = self.state_lock.lock().await;
        self.store.save(&Session::default()).await?;
        info!("Session invalidated");
        Ok(())
    }

    /// Bounded provisioning loop.
    ///
    /// Each attempt runs the full workflow with a freshly generated identity;
    /// attempts share nothing but the budget. Exhaustion is
    /// [`Error::ProvisioningExhausted`](crate::Error::ProvisioningExhausted).
    async fn provision_session(&self) -> Result<Session> {
        let max_attempts = self.settings.session.max_registration_attempts;
        let interval = Duration::from_millis(self.settings.session.retry_interval_ms);

        let session = poll_until(max_attempts, interval, |attempt| {
            self.attempt_provision(attempt, max_attempts)
        })
        .await?;

        session.ok_or_else(|| crate::Error::provisioning_exhausted(max_attempts))
    }

    /// One provisioning attempt; any step error is caught here so the loop
    /// can move on to the next attempt
    async fn attempt_provision(&self, attempt: u32, max_attempts: u32) -> Result<Attempt<Session>> {
        info!("Registration attempt {}/{}", attempt, max_attempts);

        match self.try_provision_once().await {
            Ok(session) => Ok(Attempt::Ready(session)),
            Err(e) => {
                error!(
                    "Provisioning attempt {}/{} failed: {}",
                    attempt,
                    max_attempts,
                    format_error(&e)
                );
                Ok(Attempt::Pending)
            }
        }
    }

    /// The full register → verify → login workflow for one identity
    async fn try_provision_once(&self) -> Result<Session> {
        let identity = Identity::generate(&self.settings.session.mail_domains);
        info!("Generated new credentials for {}", identity.email);

        self.upstream.register(&identity).await?;

        let link = self
            .resolver
            .resolve_verification_link(&identity.email)
            .await?;
        self.upstream.click_verification(&link).await?;

        let token = self
            .upstream
            .login(&identity.email, &identity.password)
            .await?;

        Ok(Session::fresh(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Settings wired to the mock servers with millisecond poll clocks
    fn test_settings(upstream: &MockServer, mailbox: &MockServer) -> Settings {
        let mut settings = Settings::default();
        settings.upstream.base_url = upstream.uri();
        settings.upstream.convert_poll_interval_ms = 1;
        settings.upstream.convert_timeout_secs = 1;
        settings.mailbox.base_url = mailbox.uri();
        settings.mailbox.poll_interval_ms = 1;
        settings.mailbox.poll_attempts = 3;
        settings.session.retry_interval_ms = 0;
        settings.session.max_registration_attempts = 3;
        settings
    }

    fn manager_with_store(
        upstream: &MockServer,
        mailbox: &MockServer,
        dir: &tempfile::TempDir,
    ) -> SessionManager {
        let mut settings = test_settings(upstream, mailbox);
        settings.session.store_path = Some(dir.path().join("session.json"));
        SessionManager::new(settings)
    }

    /// Mount the full happy-path provisioning conversation
    async fn mount_provisioning(upstream: &MockServer, mailbox: &MockServer, token: &str) {
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(200))
            .mount(upstream)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/emails/.+"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "result": [{"id": "m1", "subject": "Please verify email"}]
            })))
            .mount(mailbox)
            .await;

        let verify_url = format!("{}/account/verify?code=1", upstream.uri());
        Mock::given(method("GET"))
            .and(path("/inbox/m1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "result": {"html_content": format!("<a href=\"{verify_url}\">Verify my Email</a>")}
            })))
            .mount(mailbox)
            .await;

        Mock::given(method("GET"))
            .and(path("/account/verify"))
            .respond_with(ResponseTemplate::new(200))
            .mount(upstream)
            .await;

        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": token})))
            .mount(upstream)
            .await;
    }

    #[tokio::test]
    async fn test_fresh_token_is_reused_without_provisioning() {
        let upstream = MockServer::start().await;
        let mailbox = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        // Any registration call would violate the fast-path contract
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let manager = manager_with_store(&upstream, &mailbox, &dir);
        let seeded = Session {
            token: Some("abc".into()),
            usage_count: 4,
        };
        let store = FileStore::new(dir.path().join("session.json"));
        store.save(&seeded).await.unwrap();

        let token = manager.get_valid_token().await.unwrap();
        assert_eq!(token, "abc");
    }

    #[tokio::test]
    async fn test_exhausted_token_triggers_provisioning() {
        let upstream = MockServer::start().await;
        let mailbox = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        mount_provisioning(&upstream, &mailbox, "fresh-token").await;

        let manager = manager_with_store(&upstream, &mailbox, &dir);
        let store = FileStore::new(dir.path().join("session.json"));
        store
            .save(&Session {
                token: Some("abc".into()),
                usage_count: 5,
            })
            .await
            .unwrap();

        let token = manager.get_valid_token().await.unwrap();
        assert_eq!(token, "fresh-token");

        // The replacement session is persisted with a zeroed counter
        let persisted = store.load().await.unwrap();
        assert_eq!(persisted.token.as_deref(), Some("fresh-token"));
        assert_eq!(persisted.usage_count, 0);
    }

    #[tokio::test]
    async fn test_absent_token_triggers_provisioning() {
        let upstream = MockServer::start().await;
        let mailbox = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        mount_provisioning(&upstream, &mailbox, "first-token").await;

        let manager = manager_with_store(&upstream, &mailbox, &dir);
        let token = manager.get_valid_token().await.unwrap();
        assert_eq!(token, "first-token");
    }

    #[tokio::test]
    async fn test_persistent_registration_failure_exhausts_budget() {
        let upstream = MockServer::start().await;
        let mailbox = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        // Exactly max_registration_attempts register calls, nothing else
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&upstream)
            .await;

        let manager = manager_with_store(&upstream, &mailbox, &dir);
        let result = manager.get_valid_token().await;
        assert!(matches!(
            result,
            Err(crate::Error::ProvisioningExhausted { attempts: 3 })
        ));

        // Zero session mutation on the failure path
        let store = FileStore::new(dir.path().join("session.json"));
        assert_eq!(store.load().await.unwrap(), Session::default());
    }

    #[tokio::test]
    async fn test_record_usage_increments_and_persists() {
        let upstream = MockServer::start().await;
        let mailbox = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        let manager = manager_with_store(&upstream, &mailbox, &dir);
        let store = FileStore::new(dir.path().join("session.json"));
        store.save(&Session::fresh("abc")).await.unwrap();

        for expected in 1..=3 {
            let count = manager.record_usage().await.unwrap();
            assert_eq!(count, expected);
        }
        assert_eq!(store.load().await.unwrap().usage_count, 3);
    }

    #[tokio::test]
    async fn test_invalidate_session_forces_reprovisioning() {
        let upstream = MockServer::start().await;
        let mailbox = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        mount_provisioning(&upstream, &mailbox, "replacement").await;

        let manager = manager_with_store(&upstream, &mailbox, &dir);
        let store = FileStore::new(dir.path().join("session.json"));
        store
            .save(&Session {
                token: Some("abc".into()),
                usage_count: 1,
            })
            .await
            .unwrap();

        manager.invalidate_session().await.unwrap();
        assert_eq!(
            manager.session_status().await.unwrap(),
            Session::default()
        );

        let token = manager.get_valid_token().await.unwrap();
        assert_eq!(token, "replacement");
    }

    #[tokio::test]
    async fn test_store_failure_is_fatal_before_provisioning() {
        struct BrokenStore;

        #[async_trait::async_trait]
        impl SessionStore for BrokenStore {
            async fn load(&self) -> crate::Result<Session> {
                Err(crate::Error::store_unavailable("disk on fire"))
            }

            async fn save(&self, _session: &Session) -> crate::Result<()> {
                Err(crate::Error::store_unavailable("disk on fire"))
            }
        }

        let upstream = MockServer::start().await;
        let mailbox = MockServer::start().await;

        // Provisioning must never start when the store is down
        Mock::given(method("POST"))
            .and(path("/register"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&upstream)
            .await;

        let settings = test_settings(&upstream, &mailbox);
        let client = build_http_client(&settings);
        let mailbox_client =
            MailboxClient::new(client.clone(), settings.mailbox.base_url.clone());
        let manager =
            SessionManagerGeneric::with_parts(settings, BrokenStore, mailbox_client, client);

        let result = manager.get_valid_token().await;
        assert!(matches!(result, Err(crate::Error::StoreUnavailable { .. })));

        let result = manager.record_usage().await;
        assert!(matches!(result, Err(crate::Error::StoreUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_second_attempt_succeeds_after_login_failure() {
        let upstream = MockServer::start().await;
        let mailbox = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        mount_provisioning(&upstream, &mailbox, "second-try").await;

        // First login yields no token; the attempt fails and the loop retries
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "nope"})))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&upstream)
            .await;

        let manager = manager_with_store(&upstream, &mailbox, &dir);
        let token = manager.get_valid_token().await.unwrap();
        assert_eq!(token, "second-try");
    }
}
