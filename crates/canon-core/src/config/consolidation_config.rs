use serde::{Deserialize, Serialize};

use super::defaults;

/// Merge and enrichment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Keywords extracted from the description during enrichment.
    pub max_keywords: usize,
    /// History entries retained in a record's extensions.
    pub max_history_entries: usize,
    /// Descriptions longer than this are not enriched.
    pub max_enrichment_chars: usize,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            max_keywords: defaults::DEFAULT_MAX_KEYWORDS,
            max_history_entries: defaults::DEFAULT_MAX_HISTORY_ENTRIES,
            max_enrichment_chars: defaults::DEFAULT_MAX_ENRICHMENT_CHARS,
        }
    }
}
