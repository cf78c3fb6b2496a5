//! SafeOperation: readiness probe → timeout → retry/backoff → fallback.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use canon_core::config::ResilienceConfig;
use canon_core::errors::CanonResult;
use canon_core::traits::IReadiness;

use crate::backoff::backoff_delay;
use crate::stats::OperationStats;

/// Mediates every call to an external source.
///
/// Each attempt receives a child [`CancellationToken`]. When an attempt times
/// out its future is dropped (stopping it at its next suspension point) and
/// its token is cancelled, so any work the operation spawned can observe the
/// abandonment and stop. [`SafeOperation::shutdown`] cancels every in-flight
/// attempt and cuts pending backoff sleeps short.
#[derive(Debug)]
pub struct SafeOperation {
    config: ResilienceConfig,
    stats: Mutex<OperationStats>,
    root: CancellationToken,
}

impl SafeOperation {
    pub fn new(config: ResilienceConfig) -> Self {
        Self {
            config,
            stats: Mutex::new(OperationStats::default()),
            root: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ResilienceConfig {
        &self.config
    }

    fn stats_mut(&self) -> MutexGuard<'_, OperationStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the counters for health reporting.
    pub fn stats(&self) -> OperationStats {
        self.stats_mut().clone()
    }

    /// Cancel all in-flight attempts; later calls fall back after their
    /// first failed attempt.
    pub fn shutdown(&self) {
        self.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Run `operation` against `target`, returning `fallback` on any failure.
    ///
    /// Performs `1 + max_retries` attempts at most. Never panics or errors.
    pub async fn run<R, T, F, Fut>(
        &self,
        target: &R,
        label: &str,
        fallback: T,
        mut operation: F,
    ) -> T
    where
        R: IReadiness + ?Sized,
        F: FnMut(CancellationToken) -> Fut,
        Fut: Future<Output = CanonResult<T>>,
    {
        if !target.is_ready() {
            let mut stats = self.stats_mut();
            stats.not_ready += 1;
            stats.misses += 1;
            debug!(label, target = target.name(), "target not ready, using fallback");
            return fallback;
        }

        let attempts = self.config.max_retries.saturating_add(1);
        let timeout = self.config.timeout();

        for attempt in 0..attempts {
            if attempt > 0 {
                self.stats_mut().retries += 1;
            }

            let token = self.root.child_token();
            match tokio::time::timeout(timeout, operation(token.clone())).await {
                Ok(Ok(value)) => {
                    self.stats_mut().hits += 1;
                    return value;
                }
                Ok(Err(e)) => {
                    self.record_failure(label);
                    debug!(label, attempt, error = %e, "attempt failed");
                }
                Err(_) => {
                    token.cancel();
                    self.stats_mut().timeouts += 1;
                    self.record_failure(label);
                    debug!(
                        label,
                        attempt,
                        timeout_ms = timeout.as_millis() as u64,
                        "attempt timed out"
                    );
                }
            }

            if attempt + 1 < attempts {
                let delay =
                    backoff_delay(self.config.base_delay(), self.config.max_delay(), attempt);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = self.root.cancelled() => break,
                }
            }
        }

        self.stats_mut().misses += 1;
        warn!(
            label,
            target = target.name(),
            attempts,
            "operation failed after retries, using fallback"
        );
        fallback
    }

    fn record_failure(&self, label: &str) {
        *self
            .stats_mut()
            .failures_by_label
            .entry(label.to_string())
            .or_insert(0) += 1;
    }
}

impl Default for SafeOperation {
    fn default() -> Self {
        Self::new(ResilienceConfig::default())
    }
}
