//! Durable key-value storage
//!
//! The original client kept per-identity filter sets (plus theme and
//! locale) in browser local storage. This is the same contract: plain JSON
//! values under string keys, best-effort persistence, last writer wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Key-value storage for JSON-serializable client state
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;

    /// Store a value. Persistence is best-effort: failures are logged,
    /// never surfaced to the caller.
    async fn set(&self, key: &str, value: Value);

    async fn remove(&self, key: &str);
}

/// Default storage location
pub fn default_storage_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("yatl")
        .join("storage.json")
}

/// Storage backed by a single JSON map file
pub struct FileStorage {
    path: PathBuf,
    map: Mutex<HashMap<String, Value>>,
}

impl FileStorage {
    /// Open storage at `path`, loading any existing map.
    ///
    /// A missing file starts empty; an unreadable one is logged and
    /// treated as empty rather than failing startup.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let map = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "open: corrupt storage file, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        debug!(path = %path.display(), entries = map.len(), "open: loaded");
        Self {
            path,
            map: Mutex::new(map),
        }
    }

    fn persist(&self, map: &HashMap<String, Value>) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "persist: cannot create storage dir");
                return;
            }
        }
        match serde_json::to_string_pretty(map) {
            Ok(content) => {
                if let Err(e) = std::fs::write(&self.path, content) {
                    warn!(path = %self.path.display(), error = %e, "persist: write failed");
                }
            }
            Err(e) => warn!(error = %e, "persist: serialization failed"),
        }
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Option<Value> {
        self.map.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) {
        let mut map = self.map.lock().await;
        map.insert(key.to_string(), value);
        self.persist(&map);
    }

    async fn remove(&self, key: &str) {
        let mut map = self.map.lock().await;
        if map.remove(key).is_some() {
            self.persist(&map);
        }
    }
}

/// In-memory storage for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStorage {
    map: Mutex<HashMap<String, Value>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Option<Value> {
        self.map.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) {
        self.map.lock().await.insert(key.to_string(), value);
    }

    async fn remove(&self, key: &str) {
        self.map.lock().await.remove(key);
    }
}
