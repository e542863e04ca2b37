// ============================================================================
// State store
// ============================================================================
//
// Persistence contract for instance state, keyed by index name. `put` is an
// atomic upsert; the engine issues exactly one per tick, under the manager's
// per-index exclusion. Two implementations ship with the crate: a volatile
// in-memory store for tests and embedding, and a file-backed store that
// rewrites its file atomically through a temp file.

use crate::core::{LifecycleError, Result};
use crate::instance::state::PolicyInstanceState;
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, index: &str) -> Result<Option<PolicyInstanceState>>;

    /// Atomic upsert of the full record.
    async fn put(&self, index: &str, state: &PolicyInstanceState) -> Result<()>;

    /// Drop the record; used when the index itself ceases to exist.
    async fn remove(&self, index: &str) -> Result<()>;

    /// Names of all indices with a stored record.
    async fn keys(&self) -> Result<Vec<String>>;
}

/// Volatile store backed by a map.
#[derive(Default)]
pub struct MemoryStateStore {
    states: RwLock<HashMap<String, PolicyInstanceState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, index: &str) -> Result<Option<PolicyInstanceState>> {
        Ok(self.states.read().await.get(index).cloned())
    }

    async fn put(&self, index: &str, state: &PolicyInstanceState) -> Result<()> {
        self.states
            .write()
            .await
            .insert(index.to_string(), state.clone());
        Ok(())
    }

    async fn remove(&self, index: &str) -> Result<()> {
        self.states.write().await.remove(index);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.states.read().await.keys().cloned().collect();
        keys.sort_unstable();
        Ok(keys)
    }
}

/// Durable store keeping all records in one MessagePack file. Every mutation
/// rewrites the file through a temp file in the same directory, so readers
/// never observe a partial write.
pub struct FileStateStore {
    path: PathBuf,
    states: RwLock<HashMap<String, PolicyInstanceState>>,
}

impl FileStateStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LifecycleError::Store(format!("failed to create state directory: {}", e))
            })?;
        }
        let states = if path.exists() {
            let bytes = std::fs::read(&path)
                .map_err(|e| LifecycleError::Store(format!("failed to read state file: {}", e)))?;
            rmp_serde::from_slice(&bytes).map_err(|e| {
                LifecycleError::Store(format!("failed to decode state file: {}", e))
            })?
        } else {
            HashMap::new()
        };
        debug!(
            "opened state store at '{}' with {} records",
            path.display(),
            states.len()
        );
        Ok(Self {
            path,
            states: RwLock::new(states),
        })
    }

    fn flush(&self, states: &HashMap<String, PolicyInstanceState>) -> Result<()> {
        let bytes = rmp_serde::to_vec_named(states)
            .map_err(|e| LifecycleError::Store(format!("failed to encode states: {}", e)))?;
        let directory = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(directory)
            .map_err(|e| LifecycleError::Store(format!("failed to create temp file: {}", e)))?;
        tmp.write_all(&bytes)
            .map_err(|e| LifecycleError::Store(format!("failed to write state file: {}", e)))?;
        tmp.persist(&self.path)
            .map_err(|e| LifecycleError::Store(format!("failed to persist state file: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, index: &str) -> Result<Option<PolicyInstanceState>> {
        Ok(self.states.read().await.get(index).cloned())
    }

    async fn put(&self, index: &str, state: &PolicyInstanceState) -> Result<()> {
        let mut states = self.states.write().await;
        states.insert(index.to_string(), state.clone());
        self.flush(&states)
    }

    async fn remove(&self, index: &str) -> Result<()> {
        let mut states = self.states.write().await;
        if states.remove(index).is_some() {
            self.flush(&states)?;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.states.read().await.keys().cloned().collect();
        keys.sort_unstable();
        Ok(keys)
    }
}
