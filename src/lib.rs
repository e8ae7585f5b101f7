//! Statement Relay
//!
//! A self-provisioning relay in front of a bank-statement-to-CSV conversion
//! service. End users upload a PDF statement; the relay authenticates against
//! the upstream service with a disposable account it creates on demand (via a
//! temporary-email provider and an email verification round-trip) and returns
//! the converted CSV.
//!
//! # Architecture
//!
//! The relay runs in two modes:
//! - **HTTP Server Mode**: an always-running REST API accepting multipart PDF
//!   uploads
//! - **Convert Mode**: a command-line one-shot conversion of a local file
//!
//! Both modes share the same core: a [`SessionManager`] that owns the
//! persisted `{token, usage_count}` session, hands out a valid bearer token
//! on demand, and transparently provisions a fresh disposable account when
//! the token is absent or its usage quota is exhausted.
//!
//! # Deployment constraint
//!
//! Session state is serialized by an in-process lock only. Run exactly one
//! relay instance per session store path; two instances sharing one store can
//! undercount usage or provision redundant upstream accounts.
//!
//! # Usage
//!
//! ## HTTP Server Mode
//!
//! ```bash
//! statement-relay server --port 8279 --host 0.0.0.0
//! ```
//!
//! ## Convert Mode
//!
//! ```bash
//! statement-relay --input statement.pdf --output statement.csv
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod server;
pub mod session;
pub mod store;
pub mod types;
pub mod utils;

pub use config::{ConfigLoader, Settings};
pub use error::{Error, Result};
pub use session::SessionManager;
pub use store::{FileStore, SessionStore};
pub use types::{ErrorResponse, PingResponse, Session, SessionStatusResponse};
