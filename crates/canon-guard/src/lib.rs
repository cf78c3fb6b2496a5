//! # canon-guard
//!
//! Serializes consolidation passes. [`ConsolidationGuard::start`] performs its
//! check-and-set inside one critical section with no suspension point, so two
//! callers can never both observe "not running". Blocked callers re-queue
//! through [`ConsolidationQueue`] instead of polling.

pub mod decision;
pub mod guard;
pub mod queue;

pub use decision::{BlockReason, Blocked, GuardDecision, RecommendedAction};
pub use guard::{ActivePass, ConsolidationGuard, ForcedRelease, GuardStatistics, GuardStatus};
pub use queue::{ConsolidationQueue, QueueOutcome};
