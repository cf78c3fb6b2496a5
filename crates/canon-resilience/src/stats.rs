use std::collections::BTreeMap;

use serde::Serialize;

/// Counters accumulated across every [`crate::SafeOperation::run`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationStats {
    /// Calls that produced a real result.
    pub hits: u64,
    /// Calls that fell back.
    pub misses: u64,
    /// Attempts abandoned on timeout.
    pub timeouts: u64,
    /// Calls short-circuited because the target was not ready.
    pub not_ready: u64,
    /// Attempts beyond the first.
    pub retries: u64,
    /// Failed attempts per label.
    pub failures_by_label: BTreeMap<String, u64>,
}

impl OperationStats {
    /// Fraction of calls that avoided the fallback. `1.0` before any call.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            1.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn failures_for(&self, label: &str) -> u64 {
        self.failures_by_label.get(label).copied().unwrap_or(0)
    }
}
