use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Retry, backoff, and timeout settings for calls to external sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Backoff before retry `n` is `base_delay_ms * 2^n`.
    pub base_delay_ms: u64,
    /// Upper bound for a single backoff sleep.
    pub max_delay_ms: u64,
    /// Per-attempt timeout.
    pub timeout_ms: u64,
}

impl ResilienceConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::DEFAULT_MAX_RETRIES,
            base_delay_ms: defaults::DEFAULT_BASE_DELAY_MS,
            max_delay_ms: defaults::DEFAULT_MAX_DELAY_MS,
            timeout_ms: defaults::DEFAULT_OPERATION_TIMEOUT_MS,
        }
    }
}
