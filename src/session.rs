use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use crate::error::{ServiceError, ServiceResult};
use crate::types::{RecordId, Role};

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub token: String,
    pub refresh_token: Option<String>,
    pub role: Role,
    pub user_id: RecordId,
}

impl Session {
    pub fn new(token: impl Into<String>, role: Role, user_id: impl Into<RecordId>) -> Self {
        Self {
            token: token.into(),
            refresh_token: None,
            role,
            user_id: user_id.into(),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

/// On-disk shape of the session, keyed the same way the web client keys its
/// local storage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(rename = "accessToken", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(rename = "userRole", default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<Role>,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<RecordId>,
    #[serde(rename = "savedAt", default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
}

impl StoredSession {
    fn from_session(session: &Session) -> Self {
        Self {
            access_token: Some(session.token.clone()),
            refresh_token: session.refresh_token.clone(),
            user_role: Some(session.role),
            user_id: Some(session.user_id.clone()),
            saved_at: Some(Utc::now().to_rfc3339()),
        }
    }

    /// A stored session counts only when token, role and user id are all set.
    fn into_session(self) -> Option<Session> {
        let token = self.access_token.filter(|t| !t.trim().is_empty())?;
        Some(Session {
            token,
            refresh_token: self.refresh_token,
            role: self.user_role?,
            user_id: self.user_id?,
        })
    }
}

/// Durable storage behind the session store.
pub trait SessionBackend: Send + Sync {
    fn load(&self) -> ServiceResult<Option<StoredSession>>;
    fn save(&self, stored: &StoredSession) -> ServiceResult<()>;
    fn clear(&self) -> ServiceResult<()>;
}

#[derive(Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<StoredSession>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionBackend for MemoryBackend {
    fn load(&self) -> ServiceResult<Option<StoredSession>> {
        Ok(self.slot.lock().map_err(poisoned)?.clone())
    }

    fn save(&self, stored: &StoredSession) -> ServiceResult<()> {
        *self.slot.lock().map_err(poisoned)? = Some(stored.clone());
        Ok(())
    }

    fn clear(&self) -> ServiceResult<()> {
        *self.slot.lock().map_err(poisoned)? = None;
        Ok(())
    }
}

/// JSON file backend. Writes go to a temporary file that is renamed over the
/// target so a crash never leaves a half-written session.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> ServiceResult<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ServiceError::Other("couldn't find home dir".to_string()))?;
        Ok(home.join(".fundlink").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionBackend for FileBackend {
    fn load(&self) -> ServiceResult<Option<StoredSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut file = File::open(&self.path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, stored: &StoredSession) -> ServiceResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp = self.path.with_extension("tmp");
        let mut f = File::create(&temp)?;
        let content = serde_json::to_string_pretty(stored)?;
        f.write_all(content.as_bytes())?;
        f.sync_all()?;
        fs::rename(temp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> ServiceResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Holds the current session and mirrors it to a [`SessionBackend`].
///
/// Shared by `Arc` between the API client and the route guard. Nothing here
/// runs an expiry timer; expiry is noticed when the backend answers 401/403.
pub struct SessionStore {
    backend: Box<dyn SessionBackend>,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Builds a store and restores whatever the backend holds. A corrupt or
    /// partial record is treated as "logged out".
    pub fn open(backend: Box<dyn SessionBackend>) -> Self {
        let current = match backend.load() {
            Ok(Some(stored)) => {
                let session = stored.into_session();
                if session.is_none() {
                    tracing::warn!("stored session is incomplete, ignoring it");
                }
                session
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("failed to read stored session: {e}");
                None
            }
        };
        Self {
            backend,
            current: RwLock::new(current),
        }
    }

    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryBackend::new()))
    }

    /// Persists the session first, then swaps it in, so a failed write
    /// leaves the previous session untouched.
    pub fn set_session(&self, session: Session) -> ServiceResult<()> {
        self.backend.save(&StoredSession::from_session(&session))?;
        tracing::info!(role = %session.role, user_id = %session.user_id, "session stored");
        *self.current.write().map_err(poisoned)? = Some(session);
        Ok(())
    }

    /// Current session. A poisoned lock reads as logged out.
    pub fn session(&self) -> Option<Session> {
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(e) => {
                tracing::warn!("session lock poisoned, treating as logged out: {e}");
                None
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.session().map(|s| s.token)
    }

    pub fn role(&self) -> Option<Role> {
        self.session().map(|s| s.role)
    }

    pub fn user_id(&self) -> Option<RecordId> {
        self.session().map(|s| s.user_id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    /// Drops the in-memory session even if the backend cannot be cleared;
    /// the backend error is still returned.
    pub fn clear(&self) -> ServiceResult<()> {
        if let Ok(mut current) = self.current.write() {
            *current = None;
        }
        self.backend.clear()?;
        tracing::info!("session cleared");
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> ServiceError {
    ServiceError::Other("session lock poisoned".to_string())
}
