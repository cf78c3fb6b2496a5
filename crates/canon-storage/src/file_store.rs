//! Directory-backed durable store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::debug;

use canon_core::errors::{CanonResult, StorageError};
use canon_core::traits::{IDurableStore, IReadiness};

use crate::paths;

/// Durable store rooted at a directory.
///
/// Writes go to a hidden temp file in the target directory and are renamed
/// into place, so a reader sees either the old or the new contents.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_seq: AtomicU64,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> CanonResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::WriteFailed {
                path: root.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            root,
            write_seq: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> CanonResult<PathBuf> {
        let mut full = self.root.clone();
        full.extend(paths::components(path)?);
        Ok(full)
    }
}

impl IReadiness for FileStore {
    fn name(&self) -> &str {
        "file-store"
    }

    fn is_ready(&self) -> bool {
        self.root.is_dir()
    }
}

#[async_trait]
impl IDurableStore for FileStore {
    async fn exists(&self, path: &str) -> CanonResult<bool> {
        let full = self.resolve(path)?;
        tokio::fs::try_exists(&full)
            .await
            .map_err(|e| {
                StorageError::ReadFailed {
                    path: path.to_string(),
                    reason: e.to_string(),
                }
                .into()
            })
    }

    async fn read_file(&self, path: &str) -> CanonResult<String> {
        let full = self.resolve(path)?;
        tokio::fs::read_to_string(&full).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound {
                    path: path.to_string(),
                }
                .into()
            } else {
                StorageError::ReadFailed {
                    path: path.to_string(),
                    reason: e.to_string(),
                }
                .into()
            }
        })
    }

    async fn write_file(&self, path: &str, contents: &str) -> CanonResult<()> {
        let full = self.resolve(path)?;
        let write_err = |e: std::io::Error| StorageError::WriteFailed {
            path: path.to_string(),
            reason: e.to_string(),
        };

        let parent = full.parent().unwrap_or(&self.root).to_path_buf();
        tokio::fs::create_dir_all(&parent).await.map_err(write_err)?;

        let file_name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let seq = self.write_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = parent.join(format!(".{file_name}.{}.{seq}.tmp", std::process::id()));

        tokio::fs::write(&tmp, contents.as_bytes())
            .await
            .map_err(write_err)?;
        if let Err(e) = tokio::fs::rename(&tmp, &full).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_err(e).into());
        }
        debug!(path, bytes = contents.len(), "file written");
        Ok(())
    }

    async fn list_files(&self, dir: &str) -> CanonResult<Vec<String>> {
        let (full, prefix) = if dir.trim_matches('/').is_empty() {
            (self.root.clone(), String::new())
        } else {
            let normalized = paths::normalize(dir)?;
            (self.resolve(dir)?, format!("{normalized}/"))
        };

        let mut entries = match tokio::fs::read_dir(&full).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::ReadFailed {
                    path: dir.to_string(),
                    reason: e.to_string(),
                }
                .into())
            }
        };

        let read_err = |e: std::io::Error| StorageError::ReadFailed {
            path: dir.to_string(),
            reason: e.to_string(),
        };
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
            let file_type = entry.file_type().await.map_err(read_err)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if file_type.is_file() && !name.starts_with('.') {
                files.push(format!("{prefix}{name}"));
            }
        }
        files.sort();
        Ok(files)
    }
}
