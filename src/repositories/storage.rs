use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::models::RepositoryResult;

/// String key-value store the cart snapshot lives in
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`
    async fn get_item(&self, key: &str) -> RepositoryResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set_item(&self, key: &str, value: String) -> RepositoryResult<()>;

    /// Drop `key` if present
    async fn remove_item(&self, key: &str) -> RepositoryResult<()>;
}

/// Process-local storage, lost on restart
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with one entry
    pub fn with_item(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStorage for InMemoryStorage {
    async fn get_item(&self, key: &str) -> RepositoryResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> RepositoryResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> RepositoryResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// File-backed storage: a JSON object of key -> value, rewritten whole on every change
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStorage {
    /// Open the storage file. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> RepositoryResult<Self> {
        Self::open_with(path.into(), false).await
    }

    /// Like [`FileStorage::open`], but an unparseable file is logged and
    /// replaced by an empty store on the next write
    pub async fn open_or_discard(path: impl Into<PathBuf>) -> RepositoryResult<Self> {
        Self::open_with(path.into(), true).await
    }

    async fn open_with(path: PathBuf, discard_unreadable: bool) -> RepositoryResult<Self> {
        let entries = match fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) if discard_unreadable => {
                    warn!(path = %path.display(), error = %e, "Discarding unreadable storage file");
                    HashMap::new()
                }
                Err(e) => return Err(e.into()),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "Storage file not found, starting empty");
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), entries = entries.len(), "Opened file storage");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, entries: &HashMap<String, String>) -> RepositoryResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let data = serde_json::to_vec(entries)?;

        // Write a sibling file and rename it over the original so a crash
        // mid-write never leaves a truncated store behind
        let staging = self.staging_path();
        fs::write(&staging, data).await?;
        fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get_item(&self, key: &str) -> RepositoryResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> RepositoryResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        self.flush(&entries).await
    }

    async fn remove_item(&self, key: &str) -> RepositoryResult<()> {
        let mut entries = self.entries.write().await;
        if entries.remove(key).is_some() {
            self.flush(&entries).await?;
        }
        Ok(())
    }
}
