//! ConsolidationGuard: single-pass serialization with per-key duplicate
//! suppression.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use canon_core::config::GuardConfig;

use crate::decision::{BlockReason, Blocked, GuardDecision, RecommendedAction};

/// Cumulative counters. Never reset during the guard's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GuardStatistics {
    pub total_starts: u64,
    pub total_blocked: u64,
    pub total_forced: u64,
    pub total_completed: u64,
    pub total_stale_releases: u64,
}

/// Point-in-time view of the guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardStatus {
    pub is_running: bool,
    pub current_key: Option<String>,
    pub current_operation_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub running_for_ms: Option<u64>,
    /// Keys with attempt history still retained.
    pub tracked_keys: usize,
}

/// Details of a pass abandoned by [`ConsolidationGuard::force_release`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForcedRelease {
    pub key: String,
    pub operation_id: String,
    pub running_for_ms: u64,
}

#[derive(Debug)]
struct RunningPass {
    key: String,
    operation_id: String,
    started: Instant,
    started_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct GuardState {
    running: Option<RunningPass>,
    attempts: HashMap<String, VecDeque<Instant>>,
    stats: GuardStatistics,
}

/// Serializes consolidation passes.
///
/// Constructed once per engine and shared by reference (usually behind an
/// `Arc`). Independent instances share nothing, so tests can build their own.
#[derive(Debug)]
pub struct ConsolidationGuard {
    config: GuardConfig,
    state: Mutex<GuardState>,
}

impl ConsolidationGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            state: Mutex::new(GuardState::default()),
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advisory check. A `true` answer is not a reservation: callers must
    /// still call [`Self::start`] and handle its rejection.
    pub fn can_start(&self, key: &str) -> GuardDecision {
        let state = self.lock();
        self.evaluate(&state, key, Instant::now())
    }

    /// Atomically check and claim the guard for `key`.
    ///
    /// Returns the operation id (generated when `operation_id` is `None`).
    pub fn start(&self, key: &str, operation_id: Option<String>) -> Result<String, Blocked> {
        let now = Instant::now();
        let mut state = self.lock();

        let decision = self.evaluate(&state, key, now);
        if let (Some(reason), Some(action)) = (decision.reason, decision.recommended_action) {
            state.stats.total_blocked += 1;
            debug!(key, reason = %reason, "consolidation start blocked");
            return Err(Blocked {
                key: key.to_string(),
                reason,
                recommended_action: action,
            });
        }

        let operation_id = operation_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        state.running = Some(RunningPass {
            key: key.to_string(),
            operation_id: operation_id.clone(),
            started: now,
            started_at: Utc::now(),
        });
        state.stats.total_starts += 1;

        let window = self.config.duplicate_window();
        prune_expired(&mut state.attempts, window, now);
        let history_len = self.config.attempt_history_per_key.max(1);
        let history = state.attempts.entry(key.to_string()).or_default();
        history.push_back(now);
        while history.len() > history_len {
            history.pop_front();
        }

        info!(key, operation_id = %operation_id, "consolidation started");
        Ok(operation_id)
    }

    /// Claim the guard and get a handle that releases it on drop.
    pub fn enter(&self, key: &str) -> Result<ActivePass<'_>, Blocked> {
        let operation_id = self.start(key, None)?;
        Ok(ActivePass {
            guard: self,
            key: key.to_string(),
            operation_id,
            released: false,
        })
    }

    /// Release the guard held by `operation_id`.
    ///
    /// Returns `false` (and leaves the guard untouched) when `operation_id` is
    /// not the running operation, e.g. after a force release.
    pub fn end(&self, operation_id: &str, key: &str) -> bool {
        let mut state = self.lock();
        let matches = state
            .running
            .as_ref()
            .is_some_and(|r| r.operation_id == operation_id);

        if !matches {
            state.stats.total_stale_releases += 1;
            warn!(key, operation_id, "ignoring release of a pass that is not running");
            return false;
        }

        if let Some(pass) = state.running.take() {
            if pass.key != key {
                warn!(
                    expected = %pass.key,
                    got = key,
                    operation_id,
                    "release key does not match running key"
                );
            }
            state.stats.total_completed += 1;
            info!(
                key = %pass.key,
                operation_id,
                elapsed_ms = pass.started.elapsed().as_millis() as u64,
                "consolidation finished"
            );
        }
        true
    }

    /// Unconditionally clear the running flag.
    ///
    /// Does not cancel the stuck pass; it only unblocks future callers. The
    /// abandoned pass's later `end` is ignored as stale.
    pub fn force_release(&self) -> Option<ForcedRelease> {
        let mut state = self.lock();
        let pass = state.running.take()?;
        state.stats.total_forced += 1;
        let running_for_ms = pass.started.elapsed().as_millis() as u64;
        error!(
            key = %pass.key,
            operation_id = %pass.operation_id,
            running_for_ms,
            "force-released consolidation guard; the running pass was abandoned"
        );
        Some(ForcedRelease {
            key: pass.key,
            operation_id: pass.operation_id,
            running_for_ms,
        })
    }

    /// How long the running pass has exceeded `ceiling`, if it has.
    pub fn stuck_for(&self, ceiling: Duration) -> Option<Duration> {
        let state = self.lock();
        let elapsed = state.running.as_ref()?.started.elapsed();
        (elapsed > ceiling).then_some(elapsed)
    }

    /// [`Self::stuck_for`] with the configured ceiling.
    pub fn is_stuck(&self) -> bool {
        self.stuck_for(self.config.stuck_ceiling()).is_some()
    }

    pub fn status(&self) -> GuardStatus {
        let state = self.lock();
        GuardStatus {
            is_running: state.running.is_some(),
            current_key: state.running.as_ref().map(|r| r.key.clone()),
            current_operation_id: state.running.as_ref().map(|r| r.operation_id.clone()),
            started_at: state.running.as_ref().map(|r| r.started_at),
            running_for_ms: state
                .running
                .as_ref()
                .map(|r| r.started.elapsed().as_millis() as u64),
            tracked_keys: state.attempts.len(),
        }
    }

    pub fn statistics(&self) -> GuardStatistics {
        self.lock().stats
    }

    /// Drop attempt history older than the duplicate window.
    ///
    /// [`Self::start`] already does this on every claim; this is for callers
    /// that want the memory back while the guard sits idle.
    pub fn prune_history(&self) {
        let window = self.config.duplicate_window();
        let mut state = self.lock();
        prune_expired(&mut state.attempts, window, Instant::now());
    }

    fn evaluate(&self, state: &GuardState, key: &str, now: Instant) -> GuardDecision {
        if let Some(running) = &state.running {
            let action = if now.saturating_duration_since(running.started)
                > self.config.stuck_ceiling()
            {
                RecommendedAction::ForceRelease
            } else {
                RecommendedAction::WaitForCompletion
            };
            let reason = if running.key == key {
                BlockReason::SameKeyRunning
            } else {
                BlockReason::AnotherRunning {
                    running_key: running.key.clone(),
                }
            };
            return GuardDecision::block(reason, action);
        }

        let window = self.config.duplicate_window();
        if let Some(last) = state.attempts.get(key).and_then(|h| h.back()) {
            let since = now.saturating_duration_since(*last);
            if since < window {
                return GuardDecision::block(
                    BlockReason::DuplicateWithinWindow {
                        since_ms: since.as_millis() as u64,
                    },
                    RecommendedAction::RetryLater {
                        after_ms: (window - since).as_millis() as u64,
                    },
                );
            }
        }

        GuardDecision::allow()
    }
}

/// Only attempts inside the duplicate window can block a start.
fn prune_expired(attempts: &mut HashMap<String, VecDeque<Instant>>, window: Duration, now: Instant) {
    attempts.retain(|_, history| {
        history.retain(|at| now.saturating_duration_since(*at) < window);
        !history.is_empty()
    });
}

impl Default for ConsolidationGuard {
    fn default() -> Self {
        Self::new(GuardConfig::default())
    }
}

/// A claimed pass. Releases the guard when dropped, including when the
/// owning future is cancelled mid-pass.
#[derive(Debug)]
pub struct ActivePass<'a> {
    guard: &'a ConsolidationGuard,
    key: String,
    operation_id: String,
    released: bool,
}

impl ActivePass<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Release now. Returns `false` if the pass had been force-released.
    pub fn finish(mut self) -> bool {
        self.released = true;
        self.guard.end(&self.operation_id, &self.key)
    }
}

impl Drop for ActivePass<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.guard.end(&self.operation_id, &self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_window() -> ConsolidationGuard {
        ConsolidationGuard::new(GuardConfig {
            duplicate_window_ms: 0,
            ..Default::default()
        })
    }

    #[test]
    fn second_start_for_same_key_is_rejected() {
        let guard = no_window();
        let op = guard.start("K", None).unwrap();

        let decision = guard.can_start("K");
        assert!(!decision.allowed);
        assert_eq!(decision.reason, Some(BlockReason::SameKeyRunning));

        let blocked = guard.start("K", None).unwrap_err();
        assert_eq!(blocked.recommended_action, RecommendedAction::WaitForCompletion);

        assert!(guard.end(&op, "K"));
        assert!(guard.start("K", None).is_ok());
    }

    #[test]
    fn other_keys_are_blocked_while_running() {
        let guard = no_window();
        guard.start("A", Some("op-a".to_string())).unwrap();
        let decision = guard.can_start("B");
        assert_eq!(
            decision.reason,
            Some(BlockReason::AnotherRunning {
                running_key: "A".to_string()
            })
        );
    }

    #[test]
    fn stale_end_is_ignored() {
        let guard = no_window();
        let op = guard.start("K", None).unwrap();
        assert!(!guard.end("someone-else", "K"));
        assert!(guard.status().is_running);
        assert!(guard.end(&op, "K"));
        assert_eq!(guard.statistics().total_stale_releases, 1);
    }

    #[test]
    fn force_release_unblocks_and_makes_late_end_stale() {
        let guard = no_window();
        let op = guard.start("K", None).unwrap();
        let forced = guard.force_release().unwrap();
        assert_eq!(forced.operation_id, op);
        assert!(!guard.status().is_running);
        assert!(!guard.end(&op, "K"));
        assert!(guard.force_release().is_none());
        assert_eq!(guard.statistics().total_forced, 1);
    }

    #[test]
    fn active_pass_releases_on_drop() {
        let guard = no_window();
        {
            let pass = guard.enter("K").unwrap();
            assert_eq!(guard.status().current_key.as_deref(), Some(pass.key()));
        }
        assert!(!guard.status().is_running);
        assert_eq!(guard.statistics().total_completed, 1);
    }

    #[test]
    fn statistics_count_starts_and_blocks() {
        let guard = no_window();
        let op = guard.start("K", None).unwrap();
        let _ = guard.start("K", None);
        let _ = guard.start("J", None);
        guard.end(&op, "K");
        let stats = guard.statistics();
        assert_eq!(stats.total_starts, 1);
        assert_eq!(stats.total_blocked, 2);
        assert_eq!(stats.total_completed, 1);
    }
}
