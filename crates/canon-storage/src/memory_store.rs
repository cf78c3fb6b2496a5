//! In-memory durable store (for testing and embedded use).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};

use async_trait::async_trait;

use canon_core::errors::{CanonResult, StorageError};
use canon_core::traits::{IDurableStore, IReadiness};

use crate::paths;

/// Map-backed store with the same path rules as [`crate::FileStore`].
#[derive(Debug)]
pub struct InMemoryStore {
    files: RwLock<BTreeMap<String, String>>,
    ready: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
            ready: AtomicBool::new(true),
        }
    }

    /// Toggle the readiness probe.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Insert a file directly, bypassing the async API.
    pub fn seed(&self, path: &str, contents: &str) -> CanonResult<()> {
        let key = paths::normalize(path)?;
        self.write().insert(key, contents.to_string());
        Ok(())
    }

    /// Current contents of a file, if any.
    pub fn snapshot(&self, path: &str) -> Option<String> {
        let key = paths::normalize(path).ok()?;
        self.read().get(&key).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, String>> {
        self.files.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, String>> {
        self.files.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IReadiness for InMemoryStore {
    fn name(&self) -> &str {
        "memory-store"
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IDurableStore for InMemoryStore {
    async fn exists(&self, path: &str) -> CanonResult<bool> {
        let key = paths::normalize(path)?;
        Ok(self.read().contains_key(&key))
    }

    async fn read_file(&self, path: &str) -> CanonResult<String> {
        let key = paths::normalize(path)?;
        self.read().get(&key).cloned().ok_or_else(|| {
            StorageError::NotFound {
                path: path.to_string(),
            }
            .into()
        })
    }

    async fn write_file(&self, path: &str, contents: &str) -> CanonResult<()> {
        let key = paths::normalize(path)?;
        self.write().insert(key, contents.to_string());
        Ok(())
    }

    async fn list_files(&self, dir: &str) -> CanonResult<Vec<String>> {
        let prefix = if dir.trim_matches('/').is_empty() {
            String::new()
        } else {
            format!("{}/", paths::normalize(dir)?)
        };
        Ok(self
            .read()
            .keys()
            .filter(|k| k.starts_with(&prefix) && !k[prefix.len()..].contains('/'))
            .cloned()
            .collect())
    }
}
