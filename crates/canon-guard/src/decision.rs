//! Outcomes of asking the guard for permission.

use serde::Serialize;

use canon_core::errors::GuardError;

/// Why a consolidation may not start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BlockReason {
    /// A pass for the same key is in flight.
    SameKeyRunning,
    /// A pass for a different key is in flight.
    AnotherRunning { running_key: String },
    /// The same key started less than the duplicate window ago.
    DuplicateWithinWindow { since_ms: u64 },
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SameKeyRunning => write!(f, "a pass for this key is already running"),
            Self::AnotherRunning { running_key } => {
                write!(f, "a pass for {running_key} is running")
            }
            Self::DuplicateWithinWindow { since_ms } => {
                write!(f, "same key started {since_ms}ms ago")
            }
        }
    }
}

/// What a blocked caller should do next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecommendedAction {
    /// Re-queue and retry once the window has passed.
    RetryLater { after_ms: u64 },
    /// Re-queue; the queue drains when the running pass ends.
    WaitForCompletion,
    /// The running pass exceeded the stuck ceiling.
    ForceRelease,
}

/// Advisory answer from [`crate::ConsolidationGuard::can_start`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardDecision {
    pub allowed: bool,
    pub reason: Option<BlockReason>,
    pub recommended_action: Option<RecommendedAction>,
}

impl GuardDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            recommended_action: None,
        }
    }

    pub fn block(reason: BlockReason, action: RecommendedAction) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            recommended_action: Some(action),
        }
    }
}

/// Rejection returned by a hard start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Blocked {
    pub key: String,
    pub reason: BlockReason,
    pub recommended_action: RecommendedAction,
}

impl From<Blocked> for GuardError {
    fn from(blocked: Blocked) -> Self {
        GuardError::Blocked {
            key: blocked.key,
            reason: blocked.reason.to_string(),
        }
    }
}
