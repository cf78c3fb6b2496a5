use async_trait::async_trait;

use super::source::IReadiness;
use crate::errors::CanonResult;

/// Hierarchical key-value file store.
///
/// Paths are `/`-separated and relative to the store root. `write_file`
/// replaces the whole file; readers never observe a partial write.
#[async_trait]
pub trait IDurableStore: IReadiness {
    async fn exists(&self, path: &str) -> CanonResult<bool>;
    async fn read_file(&self, path: &str) -> CanonResult<String>;
    async fn write_file(&self, path: &str, contents: &str) -> CanonResult<()>;
    /// Files directly under `dir`, as store paths, sorted.
    async fn list_files(&self, dir: &str) -> CanonResult<Vec<String>>;
}
