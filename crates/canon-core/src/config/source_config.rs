use serde::{Deserialize, Serialize};

use super::defaults;
use crate::record::SourceKind;

/// Priority and reliability attached to one source.
///
/// Reliability is recorded on every `ConsolidationSource` but the merger
/// never consults it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceWeights {
    pub priority: i32,
    pub reliability: i32,
}

/// Source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub primary: SourceWeights,
    pub secondary: SourceWeights,
    pub manual: SourceWeights,
    /// Directory of the durable store holding secondary candidate files.
    pub entities_dir: String,
}

impl SourceConfig {
    /// Weights configured for a source kind.
    pub fn weights(&self, kind: SourceKind) -> SourceWeights {
        match kind {
            SourceKind::Primary => self.primary,
            SourceKind::Secondary => self.secondary,
            SourceKind::Manual => self.manual,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            primary: SourceWeights {
                priority: defaults::DEFAULT_PRIMARY_PRIORITY,
                reliability: defaults::DEFAULT_PRIMARY_RELIABILITY,
            },
            secondary: SourceWeights {
                priority: defaults::DEFAULT_SECONDARY_PRIORITY,
                reliability: defaults::DEFAULT_SECONDARY_RELIABILITY,
            },
            manual: SourceWeights {
                priority: defaults::DEFAULT_MANUAL_PRIORITY,
                reliability: defaults::DEFAULT_MANUAL_RELIABILITY,
            },
            entities_dir: defaults::DEFAULT_ENTITIES_DIR.to_string(),
        }
    }
}
