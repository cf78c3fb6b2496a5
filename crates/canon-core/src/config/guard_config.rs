use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Consolidation guard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// A second start for the same key inside this window is suppressed.
    pub duplicate_window_ms: u64,
    /// A pass running longer than this is considered stuck.
    pub stuck_ceiling_ms: u64,
    /// Attempt timestamps retained per key.
    pub attempt_history_per_key: usize,
    /// Maximum number of blocked requests waiting for re-queue.
    pub max_queue_len: usize,
}

impl GuardConfig {
    pub fn duplicate_window(&self) -> Duration {
        Duration::from_millis(self.duplicate_window_ms)
    }

    pub fn stuck_ceiling(&self) -> Duration {
        Duration::from_millis(self.stuck_ceiling_ms)
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            duplicate_window_ms: defaults::DEFAULT_DUPLICATE_WINDOW_MS,
            stuck_ceiling_ms: defaults::DEFAULT_STUCK_CEILING_MS,
            attempt_history_per_key: defaults::DEFAULT_ATTEMPT_HISTORY_PER_KEY,
            max_queue_len: defaults::DEFAULT_MAX_QUEUE_LEN,
        }
    }
}
