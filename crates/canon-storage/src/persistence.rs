//! Whole-snapshot persistence of records, patterns, and effectiveness
//! history.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use canon_core::config::StorageConfig;
use canon_core::effectiveness::{EffectivenessPattern, LongTermEffectivenessRecord};
use canon_core::errors::{CanonResult, StorageError};
use canon_core::traits::IDurableStore;
use canon_core::MasterRecord;

/// Reads and writes JSON array snapshots at the configured paths.
///
/// Every save rewrites the whole file. A missing file loads as empty; a file
/// that does not parse is reported as [`StorageError::Corrupt`] and left
/// untouched.
#[derive(Clone)]
pub struct PersistenceLayer {
    store: Arc<dyn IDurableStore>,
    config: StorageConfig,
}

impl std::fmt::Debug for PersistenceLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceLayer")
            .field("store", &self.store.name())
            .field("config", &self.config)
            .finish()
    }
}

impl PersistenceLayer {
    pub fn new(store: Arc<dyn IDurableStore>, config: StorageConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn IDurableStore> {
        &self.store
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub async fn load_records(&self) -> CanonResult<Vec<MasterRecord>> {
        self.load_snapshot(&self.config.records_path).await
    }

    pub async fn save_records(&self, records: &[MasterRecord]) -> CanonResult<()> {
        self.save_snapshot(&self.config.records_path, records).await
    }

    pub async fn load_patterns(&self) -> CanonResult<Vec<EffectivenessPattern>> {
        self.load_snapshot(&self.config.patterns_path).await
    }

    pub async fn save_patterns(&self, patterns: &[EffectivenessPattern]) -> CanonResult<()> {
        self.save_snapshot(&self.config.patterns_path, patterns).await
    }

    pub async fn load_effectiveness_records(
        &self,
    ) -> CanonResult<Vec<LongTermEffectivenessRecord>> {
        self.load_snapshot(&self.config.effectiveness_path).await
    }

    pub async fn save_effectiveness_records(
        &self,
        records: &[LongTermEffectivenessRecord],
    ) -> CanonResult<()> {
        self.save_snapshot(&self.config.effectiveness_path, records)
            .await
    }

    /// Load a JSON array snapshot. Missing file → empty.
    pub async fn load_snapshot<T: DeserializeOwned>(&self, path: &str) -> CanonResult<Vec<T>> {
        if !self.store.exists(path).await? {
            debug!(path, "no snapshot on disk");
            return Ok(Vec::new());
        }
        let contents = self.store.read_file(path).await?;
        let items: Vec<T> =
            serde_json::from_str(&contents).map_err(|e| StorageError::Corrupt {
                path: path.to_string(),
                details: e.to_string(),
            })?;
        info!(path, count = items.len(), "snapshot loaded");
        Ok(items)
    }

    /// Serialize `items` as a pretty JSON array and write it whole.
    pub async fn save_snapshot<T: Serialize>(&self, path: &str, items: &[T]) -> CanonResult<()> {
        let contents = serde_json::to_string_pretty(items)?;
        self.store.write_file(path, &contents).await?;
        debug!(path, count = items.len(), "snapshot saved");
        Ok(())
    }
}
