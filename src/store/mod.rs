//! Session persistence
//!
//! The session store is a passive collaborator: it holds one serialized
//! [`Session`](crate::types::Session) blob and supports wholesale read and
//! replace. Atomicity of any read-modify-write sequence is the caller's
//! responsibility — the [`SessionManager`](crate::session::SessionManager)
//! serializes all access behind its own lock.

pub mod file;

use crate::{Result, types::Session};

pub use file::{FileStore, default_store_path};

/// Durable holder of the `{token, usage_count}` session record.
///
/// Implementations must treat "no record yet" as the empty session rather
/// than an error; only genuine unavailability of the backing medium surfaces
/// as [`Error::StoreUnavailable`](crate::Error::StoreUnavailable).
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the current session, or the empty session when none was saved yet
    async fn load(&self) -> Result<Session>;

    /// Replace the persisted session wholesale
    async fn save(&self, session: &Session) -> Result<()>;
}
