use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::{collections::HashMap, io::ErrorKind, path::PathBuf, sync::Arc};

use crate::{
    error::GuardError,
    models::{Identity, Session},
};

/// Storage key the current session is persisted under.
pub const SESSION_KEY: &str = "marketplace.session";

// 1. Durable key-value contract
/// KeyValueStorage
///
/// The durable client-side storage the Session Store persists into. Swapping
/// the implementation (files on disk, in-memory for tests) does not affect the
/// store or the guard.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, GuardError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), GuardError>;
    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), GuardError>;
}

pub type StorageState = Arc<dyn KeyValueStorage>;

// 2. File-backed implementation
/// FileStorage
///
/// One file per key under a directory. Keys are sanitized into flat file
/// names so a key can never escape the directory.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, GuardError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(GuardError::StorageUnavailable(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), GuardError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| GuardError::StorageUnavailable(e.to_string()))?;
        tokio::fs::write(self.path_for(key), value)
            .await
            .map_err(|e| GuardError::StorageUnavailable(e.to_string()))
    }

    async fn remove(&self, key: &str) -> Result<(), GuardError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GuardError::StorageUnavailable(e.to_string())),
        }
    }
}

/// Keeps only characters that are safe in a single file name segment.
fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() { "_".to_string() } else { cleaned }
}

// 3. In-memory implementation (tests, and callers with no durable storage)
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw entry, e.g. a hand-written or corrupt session payload.
    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage
            .entries
            .lock()
            .insert(key.to_string(), value.to_string());
        storage
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, GuardError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), GuardError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), GuardError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

// 4. The Session Store
/// SessionStore
///
/// Single source of truth for the current session on the client. The guard
/// receives it as an injected capability. Reads are served from memory; every
/// change is written through to durable storage so the session survives a
/// reload.
///
/// Mutations are serialized through `writes`, held across the storage call,
/// so a clear issued while a write is pending always lands after it.
pub struct SessionStore {
    storage: StorageState,
    current: RwLock<Option<Session>>,
    writes: tokio::sync::Mutex<()>,
}

impl SessionStore {
    pub fn new(storage: StorageState) -> Self {
        Self {
            storage,
            current: RwLock::new(None),
            writes: tokio::sync::Mutex::new(()),
        }
    }

    /// hydrate
    ///
    /// Loads the persisted session, if any. Never fails: an unreadable entry
    /// is removed so it cannot come back on the next load, and the store
    /// starts unauthenticated.
    pub async fn hydrate(&self) -> Option<Session> {
        let _writes = self.writes.lock().await;
        let raw = match self.storage.get(SESSION_KEY).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "session storage unreadable, starting signed out");
                None
            }
        };

        let session = match raw {
            None => None,
            Some(raw) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => Some(session),
                Err(e) => {
                    let e = GuardError::StorageCorrupt(e.to_string());
                    tracing::warn!(error = %e, "discarding persisted session");
                    if let Err(e) = self.storage.remove(SESSION_KEY).await {
                        tracing::error!(error = %e, "failed to remove corrupt session entry");
                    }
                    None
                }
            },
        };

        *self.current.write() = session.clone();
        session
    }

    pub fn current_session(&self) -> Option<Session> {
        self.current.read().clone()
    }

    /// establish_session
    ///
    /// Replaces the current session. The in-memory copy is set before the
    /// storage write; a failed write is logged and the session stays usable
    /// for this page lifetime.
    pub async fn establish_session(&self, identity: Identity) -> Session {
        let session = Session::new(identity);
        let _writes = self.writes.lock().await;
        *self.current.write() = Some(session.clone());

        match serde_json::to_string(&session) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(SESSION_KEY, &raw).await {
                    tracing::warn!(error = %e, "session not persisted");
                }
            }
            Err(e) => tracing::warn!(error = %e, "session not serializable"),
        }

        tracing::debug!(subject = %session.identity.subject_id, role = %session.identity.role, "session established");
        session
    }

    pub async fn clear_session(&self) {
        let _writes = self.writes.lock().await;
        *self.current.write() = None;
        if let Err(e) = self.storage.remove(SESSION_KEY).await {
            tracing::warn!(error = %e, "persisted session not removed");
        }
    }
}
