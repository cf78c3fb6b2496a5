//! Outcomes and read models returned by the engine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use canon_core::{MasterRecord, Rejection, SourceKind};
use canon_guard::{Blocked, GuardStatistics, GuardStatus, QueueOutcome};
use canon_observability::{DegradationEvent, Recommendation};
use canon_resilience::OperationStats;

/// Per-source summary of one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub source: SourceKind,
    pub available: bool,
    pub candidates: usize,
    pub rejections: Vec<Rejection>,
}

/// Result of a completed consolidation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassReport {
    pub subject: String,
    pub operation_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceSummary>,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: usize,
    pub conflicts_logged: usize,
    pub enrichment_failures: Vec<String>,
    pub failed_keys: Vec<String>,
    pub total_records: usize,
    pub unresolved_relationships: usize,
    /// Whether the record snapshot reached the durable store.
    pub persisted: bool,
}

impl PassReport {
    pub fn rejection_count(&self) -> usize {
        self.sources.iter().map(|s| s.rejections.len()).sum()
    }

    pub fn sources_available(&self) -> usize {
        self.sources.iter().filter(|s| s.available).count()
    }
}

/// What `consolidate` did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConsolidationOutcome {
    Completed(Box<PassReport>),
    /// The guard refused the pass. Not an error.
    Blocked {
        blocked: Blocked,
        /// Where the request went; `None` when it was not queued.
        queued: Option<QueueOutcome>,
    },
}

impl ConsolidationOutcome {
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Blocked { .. } => None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// What `initialize` restored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub records_loaded: usize,
    pub patterns_loaded: usize,
    pub effectiveness_records_loaded: usize,
    /// A snapshot could not be read; the engine runs without it.
    pub degraded: bool,
}

/// A record reachable from another through a declared relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedRecord {
    pub relation: String,
    pub record: MasterRecord,
}

/// Summary returned by `diagnose`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub total_records: usize,
    pub conflict_count: usize,
    pub last_consolidation: Option<DateTime<Utc>>,
    /// Records each source contributed to.
    pub source_coverage: BTreeMap<String, usize>,
    pub recommendations: Vec<Recommendation>,
}

/// Full engine status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub initialized: bool,
    pub degraded_mode: bool,
    pub snapshot_dirty: bool,
    pub learning_dirty: bool,
    pub total_records: usize,
    pub pattern_count: usize,
    pub effectiveness_records: usize,
    pub guard: GuardStatus,
    pub guard_statistics: GuardStatistics,
    pub operations: OperationStats,
    pub queued: Vec<String>,
    pub active_degradations: Vec<DegradationEvent>,
    pub last_pass: Option<PassReport>,
}
