//! Persistent session state.
//!
//! The browser keeps the `token` cookie for us; a terminal client has to do
//! it by hand. The cookie value lands in a small JSON file under the state
//! directory and is loaded back into the HTTP cookie jar on startup. A
//! missing or corrupt file simply means "logged out".

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
}

impl StoredSession {
    pub fn new(token: String, username: Option<String>) -> Self {
        Self {
            token,
            username,
            saved_at: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored session, treating any failure as "no session".
    pub fn load(&self) -> Option<StoredSession> {
        if !self.path.exists() {
            return None;
        }
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(?err, path = %self.path.display(), "failed to read session file");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                tracing::warn!(?err, path = %self.path.display(), "discarding corrupt session file");
                None
            }
        }
    }

    pub fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating session directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(session).context("serializing session")?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing session file {}", self.path.display()))?;
        Ok(())
    }

    /// Removes the session file. Missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| {
                format!("removing session file {}", self.path.display())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> SessionStore {
        SessionStore::new(temp.path().join("state/session.json"))
    }

    #[test]
    fn save_then_load_roundtrips() -> Result<()> {
        let temp = TempDir::new()?;
        let store = store_in(&temp);
        store.save(&StoredSession::new(
            "tok-123".into(),
            Some("ada".into()),
        ))?;

        let loaded = store.load().expect("session present");
        assert_eq!(loaded.token, "tok-123");
        assert_eq!(loaded.username.as_deref(), Some("ada"));
        Ok(())
    }

    #[test]
    fn corrupt_file_loads_as_logged_out() -> Result<()> {
        let temp = TempDir::new()?;
        let store = store_in(&temp);
        fs::create_dir_all(store.path().parent().unwrap())?;
        fs::write(store.path(), "{not json")?;

        assert!(store.load().is_none());
        Ok(())
    }

    #[test]
    fn clear_is_idempotent() -> Result<()> {
        let temp = TempDir::new()?;
        let store = store_in(&temp);
        store.clear()?;
        store.save(&StoredSession::new("tok".into(), None))?;
        store.clear()?;
        store.clear()?;
        assert!(store.load().is_none());
        Ok(())
    }
}
