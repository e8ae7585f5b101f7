//! Session lifecycle for the relay
//!
//! This module holds the core state machine: deciding whether the stored
//! bearer token is still usable, provisioning new disposable accounts through
//! the register/verify/login workflow, and the bounded polling machinery the
//! workflow is built on.

pub mod extract;
pub mod mailbox;
pub mod manager;
pub mod retry;
pub mod upstream;

pub use mailbox::{MailboxClient, MailboxProvider, VerificationResolver};
pub use manager::{SessionManager, SessionManagerGeneric, build_http_client};
pub use retry::{Attempt, poll_until};
pub use upstream::UpstreamClient;
