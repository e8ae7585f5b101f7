//! File-backed session store
//!
//! Persists the session as a small JSON file. Replacement goes through a
//! temp file and rename so a crash mid-write cannot leave a torn record
//! behind; a missing or corrupt file reads as the empty session and is
//! superseded on the next save.

use crate::{Result, store::SessionStore, types::Session};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};

/// JSON-file implementation of [`SessionStore`]
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Path of the session file
    path: PathBuf,
}

impl FileStore {
    /// Create a store backed by the given file path
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the backing file
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl SessionStore for FileStore {
    async fn load(&self) -> Result<Session> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Session file does not exist yet: {:?}", self.path);
                return Ok(Session::default());
            }
            Err(e) => {
                return Err(crate::Error::store_unavailable(format!(
                    "cannot read {:?}: {}",
                    self.path, e
                )));
            }
        };

        match serde_json::from_str(&content) {
            Ok(session) => Ok(session),
            Err(e) => {
                // Corrupt state is recoverable: the next save overwrites it.
                warn!(
                    "Session file {:?} is unreadable ({}), treating as empty",
                    self.path, e
                );
                Ok(Session::default())
            }
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = fs::create_dir_all(parent).await
        {
            return Err(crate::Error::store_unavailable(format!(
                "cannot create {:?}: {}",
                parent, e
            )));
        }

        let content = serde_json::to_string(session)?;
        let tmp_path = self.path.with_extension("json.tmp");

        fs::write(&tmp_path, content).await.map_err(|e| {
            crate::Error::store_unavailable(format!("cannot write {:?}: {}", tmp_path, e))
        })?;

        fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            crate::Error::store_unavailable(format!("cannot replace {:?}: {}", self.path, e))
        })?;

        debug!("Session saved to {:?}", self.path);
        Ok(())
    }
}

/// Default session file path following XDG Base Directory Specification
pub fn default_store_path() -> PathBuf {
    let base = if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg_cache).join("statement-relay")
    } else if let Some(cache_dir) = dirs::cache_dir() {
        cache_dir.join("statement-relay")
    } else {
        warn!("Could not determine cache directory, using current directory");
        PathBuf::from(".")
    };

    base.join("session.json")
}
