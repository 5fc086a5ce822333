//! Durable key-value persistence for notes and settings.
//!
//! The engine treats storage as a passive get/set-by-key surface: the full
//! note collection is serialized as one JSON array under `voicenotes_v1`,
//! settings as one JSON object under `settings_v1`. The `_v1` key suffix is
//! the only schema-versioning convention; keep it for forward migration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::domain::{Note, Settings};

/// Key for the persisted note collection
pub const NOTES_KEY: &str = "voicenotes_v1";

/// Key for the persisted settings object
pub const SETTINGS_KEY: &str = "settings_v1";

/// Errors that can occur with the store. Serde failures never reach this
/// type; the load/save helpers degrade and log them instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable key-value store consumed by the repository.
///
/// Implementations may be backed by anything with get/set-by-key
/// semantics; callers await uniformly regardless of whether the backend is
/// actually synchronous.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// File-backed store: one JSON document per key under a base directory.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Open the store in the default location (`$MEMOVOX_HOME`)
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(crate::config::memovox_home()?))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.base_dir).await?;
        tokio::fs::write(self.path_for(key), value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Load the full note collection.
///
/// Missing or unparseable data degrades to an empty collection with a
/// warning; in-memory state is the source of truth for the session.
pub async fn load_notes(store: &dyn KvStore) -> Vec<Note> {
    match store.get(NOTES_KEY).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(notes) => notes,
            Err(e) => {
                warn!("Failed to parse stored notes: {}", e);
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("Failed to load notes: {}", e);
            Vec::new()
        }
    }
}

/// Persist the full note collection. Best-effort: failures are logged, not
/// propagated.
pub async fn save_notes(store: &dyn KvStore, notes: &[Note]) {
    let raw = match serde_json::to_string(notes) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to serialize notes: {}", e);
            return;
        }
    };

    if let Err(e) = store.set(NOTES_KEY, &raw).await {
        warn!("Failed to save notes: {}", e);
    }
}

/// Load settings, falling back to defaults on any failure
pub async fn load_settings(store: &dyn KvStore) -> Settings {
    match store.get(SETTINGS_KEY).await {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_default(),
        _ => Settings::default(),
    }
}

/// Persist settings. Best-effort, like `save_notes`.
pub async fn save_settings(store: &dyn KvStore, settings: &Settings) {
    let raw = match serde_json::to_string(settings) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to serialize settings: {}", e);
            return;
        }
    };

    if let Err(e) = store.set(SETTINGS_KEY, &raw).await {
        warn!("Failed to save settings: {}", e);
    }
}

/// Storage statistics for the persisted note collection
#[derive(Debug, Clone, Default)]
pub struct StorageInfo {
    pub count: usize,
    pub size_bytes: usize,
}

/// Report how much is persisted under the notes key
pub async fn storage_info(store: &dyn KvStore) -> StorageInfo {
    match store.get(NOTES_KEY).await {
        Ok(Some(raw)) => {
            let count = serde_json::from_str::<Vec<Note>>(&raw)
                .map(|notes| notes.len())
                .unwrap_or(0);
            StorageInfo {
                count,
                size_bytes: raw.len(),
            }
        }
        _ => StorageInfo::default(),
    }
}
