//! Authentication state.
//!
//! A [`Session`] is built once at startup with [`Session::restore`], which
//! reads the persisted token from a [`TokenStore`]. The token can only change
//! through [`Session::login`] and [`Session::logout`]; both write through to
//! the store before updating memory.
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SESSION_PATH: &str = "config/tally_session.json";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable slot holding the bearer token across restarts.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, SessionError>;
    fn save(&self, token: &str) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    token: Option<String>,
}

/// Stores the token as a small JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        // an unreadable document means no session; the next login rewrites it
        match serde_json::from_str::<StoredSession>(&content) {
            Ok(stored) => Ok(stored.token),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), "ignoring corrupted session file: {err}");
                Ok(None)
            }
        }
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(&StoredSession {
            token: Some(token.to_string()),
        })?;
        fs::write(&self.path, payload)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.to_string()))),
        }
    }

    pub fn stored(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        Ok(self.stored())
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

pub struct Session {
    store: Box<dyn TokenStore>,
    token: RwLock<Option<String>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Reads the persisted token and returns the shared session handle.
    pub fn restore(store: impl TokenStore + 'static) -> Result<Arc<Self>, SessionError> {
        let token = store.load()?.filter(|t| !t.is_empty());
        tracing::debug!(restored = token.is_some(), "session restored");
        Ok(Arc::new(Self {
            store: Box::new(store),
            token: RwLock::new(token),
        }))
    }

    pub fn login(&self, token: impl Into<String>) -> Result<(), SessionError> {
        let token = token.into();
        self.store.save(&token)?;
        *self.token.write().unwrap_or_else(PoisonError::into_inner) =
            (!token.is_empty()).then_some(token);
        tracing::info!("session started");
        Ok(())
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::info!("session cleared");
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restores_persisted_token() {
        let store = MemoryTokenStore::with_token("abc");
        let session = Session::restore(store).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("abc"));
    }

    #[test]
    fn starts_unauthenticated_without_token() {
        let session = Session::restore(MemoryTokenStore::default()).unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn login_persists_and_logout_clears() {
        let store = MemoryTokenStore::default();
        let session = Session::restore(store.clone()).unwrap();

        session.login("tok-1").unwrap();
        assert!(session.is_authenticated());
        assert_eq!(store.stored().as_deref(), Some("tok-1"));

        session.logout().unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(store.stored(), None);
    }

    #[test]
    fn empty_token_is_not_a_session() {
        let session = Session::restore(MemoryTokenStore::with_token("")).unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn file_store_round_trips_and_tolerates_missing_file() {
        let dir = std::env::temp_dir().join(format!("tally_session_{}", std::process::id()));
        let store = FileTokenStore::new(dir.join("nested/session.json"));
        assert_eq!(store.load().unwrap(), None);

        store.save("persisted").unwrap();
        let session = Session::restore(store.clone()).unwrap();
        assert_eq!(session.token().as_deref(), Some("persisted"));

        session.logout().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn corrupted_session_file_starts_signed_out() {
        let dir = std::env::temp_dir().join(format!("tally_corrupt_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("session.json");
        fs::write(&path, "{\"tok").unwrap();

        let store = FileTokenStore::new(&path);
        let session = Session::restore(store.clone()).unwrap();
        assert!(!session.is_authenticated());

        session.login("fresh").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("fresh"));
        let _ = fs::remove_dir_all(dir);
    }
}
