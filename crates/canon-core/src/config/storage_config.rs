use serde::{Deserialize, Serialize};

use super::defaults;

/// Snapshot locations inside the durable store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory of the file-backed store.
    pub root_dir: String,
    pub records_path: String,
    pub patterns_path: String,
    pub effectiveness_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: defaults::DEFAULT_STORAGE_ROOT.to_string(),
            records_path: defaults::DEFAULT_RECORDS_PATH.to_string(),
            patterns_path: defaults::DEFAULT_PATTERNS_PATH.to_string(),
            effectiveness_path: defaults::DEFAULT_EFFECTIVENESS_PATH.to_string(),
        }
    }
}
