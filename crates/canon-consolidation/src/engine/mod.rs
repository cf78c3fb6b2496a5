//! ConsolidationEngine: the guarded pass and the record API.
//!
//! A pass loads every source through [`SafeOperation`], merges under the
//! state write lock (no suspension point inside), rebuilds the index, then
//! persists and learns best-effort. Snapshot writes are serialized and each
//! writer snapshots the state only after acquiring the write slot, so the
//! last write always carries the latest records.

mod patch;
mod report;

pub use patch::apply_patch;
pub use report::{
    ConsolidationOutcome, Diagnosis, EngineStatus, InitReport, PassReport, RelatedRecord,
    SourceSummary,
};

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

use canon_core::effectiveness::{
    EffectivenessPattern, LongTermEffectivenessRecord, PatternCategory,
};
use canon_core::errors::{CanonResult, RecordError};
use canon_core::record::{normalize_identity, RecordPatch};
use canon_core::traits::{IAuthoritativeSource, IDurableStore, IEnricher};
use canon_core::{CanonConfig, MasterRecord, SourceKind};
use canon_guard::{ConsolidationGuard, ConsolidationQueue};
use canon_learning::{EffectivenessTracker, PassOutcome, UnitOfWork};
use canon_observability::tracing_setup::events;
use canon_observability::{
    consolidation_span, generate_recommendations, learning_span, log_error, DegradationKind,
    DegradationTracker, DiagnosisSnapshot,
};
use canon_resilience::{CancellationToken, SafeOperation};
use canon_storage::PersistenceLayer;

use crate::enrichment::HeuristicEnricher;
use crate::index::RecordIndex;
use crate::loaders::{DurableLoader, ISourceLoader, LoadedSource, PrimaryLoader};
use crate::merge::{ConflictResolver, Merger};

const PERSISTENCE_COMPONENT: &str = "persistence";
const LEARNING_COMPONENT: &str = "learning-persistence";

#[derive(Debug, Default)]
struct EngineState {
    /// By identity key.
    records: BTreeMap<String, MasterRecord>,
    index: RecordIndex,
    initialized: bool,
    degraded_mode: bool,
    snapshot_dirty: bool,
    learning_dirty: bool,
    last_consolidation: Option<DateTime<Utc>>,
    unavailable_sources: Vec<SourceKind>,
    last_pass: Option<PassReport>,
}

/// Owns the records and runs consolidation passes.
pub struct ConsolidationEngine {
    config: CanonConfig,
    guard: Arc<ConsolidationGuard>,
    safe: Arc<SafeOperation>,
    loaders: Vec<Arc<dyn ISourceLoader>>,
    merger: Merger,
    persistence: PersistenceLayer,
    state: RwLock<EngineState>,
    learning: Mutex<EffectivenessTracker>,
    degradation: Mutex<DegradationTracker>,
    queue: Mutex<ConsolidationQueue>,
    persist_slot: tokio::sync::Mutex<()>,
}

impl ConsolidationEngine {
    /// Engine over a primary source and a durable store. The store holds
    /// both the secondary entity files and the snapshots.
    pub fn new(
        config: CanonConfig,
        primary: Arc<dyn IAuthoritativeSource>,
        store: Arc<dyn IDurableStore>,
    ) -> Self {
        let loaders: Vec<Arc<dyn ISourceLoader>> = vec![
            Arc::new(PrimaryLoader::new(primary)),
            Arc::new(DurableLoader::new(
                store.clone(),
                config.sources.entities_dir.clone(),
            )),
        ];
        let merger = Merger::new(
            ConflictResolver::new(config.sources.clone()),
            Arc::new(HeuristicEnricher::new(&config.consolidation)),
        );
        Self {
            guard: Arc::new(ConsolidationGuard::new(config.guard.clone())),
            safe: Arc::new(SafeOperation::new(config.resilience.clone())),
            loaders,
            merger,
            persistence: PersistenceLayer::new(store, config.storage.clone()),
            state: RwLock::new(EngineState::default()),
            learning: Mutex::new(EffectivenessTracker::new(config.learning.clone())),
            degradation: Mutex::new(DegradationTracker::with_capacity_limit(256)),
            queue: Mutex::new(ConsolidationQueue::new(config.guard.max_queue_len)),
            persist_slot: tokio::sync::Mutex::new(()),
            config,
        }
    }

    /// Share a guard with other components.
    pub fn with_guard(mut self, guard: Arc<ConsolidationGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn IEnricher>) -> Self {
        self.merger = Merger::new(ConflictResolver::new(self.config.sources.clone()), enricher);
        self
    }

    /// Replace the default loaders.
    pub fn with_loaders(mut self, loaders: Vec<Arc<dyn ISourceLoader>>) -> Self {
        self.loaders = loaders;
        self
    }

    pub fn config(&self) -> &CanonConfig {
        &self.config
    }

    pub fn guard(&self) -> &Arc<ConsolidationGuard> {
        &self.guard
    }

    fn read_state(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn learning(&self) -> MutexGuard<'_, EffectivenessTracker> {
        self.learning.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn degradation(&self) -> MutexGuard<'_, DegradationTracker> {
        self.degradation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn queue(&self) -> MutexGuard<'_, ConsolidationQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restore persisted snapshots.
    ///
    /// Never fails: an unreadable snapshot is logged, tracked as a
    /// degradation, and replaced by an empty set.
    pub async fn initialize(&self) -> InitReport {
        let mut report = InitReport::default();

        let records = match self.persistence.load_records().await {
            Ok(records) => records,
            Err(e) => {
                log_error(&e, &[("snapshot", "records")], "record snapshot unreadable");
                self.degradation().record(
                    PERSISTENCE_COMPONENT,
                    DegradationKind::PersistenceFailure,
                    &e.to_string(),
                    "start with no records",
                );
                report.degraded = true;
                Vec::new()
            }
        };

        let patterns = match self.persistence.load_patterns().await {
            Ok(patterns) => patterns,
            Err(e) => {
                log_error(&e, &[("snapshot", "patterns")], "pattern snapshot unreadable");
                self.degradation().record(
                    LEARNING_COMPONENT,
                    DegradationKind::PersistenceFailure,
                    &e.to_string(),
                    "start with no patterns",
                );
                report.degraded = true;
                Vec::new()
            }
        };

        let effectiveness = match self.persistence.load_effectiveness_records().await {
            Ok(records) => records,
            Err(e) => {
                log_error(
                    &e,
                    &[("snapshot", "effectiveness")],
                    "effectiveness snapshot unreadable",
                );
                self.degradation().record(
                    LEARNING_COMPONENT,
                    DegradationKind::PersistenceFailure,
                    &e.to_string(),
                    "start with no effectiveness history",
                );
                report.degraded = true;
                Vec::new()
            }
        };

        report.patterns_loaded = patterns.len();
        report.effectiveness_records_loaded = effectiveness.len();
        self.learning().restore(patterns, effectiveness);

        let mut by_key = BTreeMap::new();
        for record in records {
            if by_key.contains_key(&record.identity_key) {
                warn!(identity_key = %record.identity_key, "duplicate record in snapshot, keeping the first");
                continue;
            }
            by_key.insert(record.identity_key.clone(), record);
        }
        report.records_loaded = by_key.len();

        {
            let mut state = self.write_state();
            state.index = RecordIndex::build(by_key.values());
            state.records = by_key;
            state.initialized = true;
            state.degraded_mode = report.degraded;
        }

        info!(
            records = report.records_loaded,
            patterns = report.patterns_loaded,
            effectiveness_records = report.effectiveness_records_loaded,
            degraded = report.degraded,
            "engine initialized"
        );
        report
    }

    /// Run a consolidation pass for `subject`.
    ///
    /// A blocked request is queued and reported as
    /// [`ConsolidationOutcome::Blocked`]. After a completed pass the queue is
    /// drained.
    pub async fn consolidate(&self, subject: &str) -> ConsolidationOutcome {
        let outcome = self.run_guarded(subject, true).await;
        if !outcome.is_blocked() {
            let drained = self.drain_queue().await;
            if !drained.is_empty() {
                debug!(drained = drained.len(), "queue drained after pass");
            }
        }
        outcome
    }

    /// Run queued requests in FIFO order until the queue is empty or the
    /// guard blocks again, in which case the key goes back to the head.
    pub async fn drain_queue(&self) -> Vec<ConsolidationOutcome> {
        let mut outcomes = Vec::new();
        loop {
            let Some(key) = self.queue().pop() else {
                break;
            };
            let outcome = self.run_guarded(&key, false).await;
            let blocked = outcome.is_blocked();
            outcomes.push(outcome);
            if blocked {
                self.queue().requeue_front(key);
                break;
            }
        }
        outcomes
    }

    /// Drain the queue every `interval` until `cancel` fires.
    pub fn spawn_queue_drainer(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let pending = !engine.queue().is_empty();
                        if pending {
                            engine.drain_queue().await;
                        }
                    }
                }
            }
            debug!("queue drainer stopped");
        })
    }

    /// Cancel in-flight source calls and cut retries short.
    pub fn shutdown(&self) {
        self.safe.shutdown();
    }

    async fn run_guarded(&self, subject: &str, enqueue: bool) -> ConsolidationOutcome {
        self.release_if_stuck();

        let pass = match self.guard.enter(subject) {
            Ok(pass) => pass,
            Err(blocked) => {
                let queued = enqueue.then(|| self.queue().push(subject));
                info!(
                    subject,
                    reason = %blocked.reason,
                    queued = ?queued,
                    "consolidation blocked"
                );
                return ConsolidationOutcome::Blocked { blocked, queued };
            }
        };

        let operation_id = pass.operation_id().to_string();
        let span = consolidation_span!(subject, operation_id);
        let report = self.run_pass(subject, &operation_id).instrument(span).await;

        if !pass.finish() {
            warn!(
                subject,
                operation_id = %operation_id,
                "pass completed after its guard was force-released"
            );
        }
        ConsolidationOutcome::Completed(Box::new(report))
    }

    fn release_if_stuck(&self) {
        let ceiling = self.guard.config().stuck_ceiling();
        if let Some(running_for) = self.guard.stuck_for(ceiling) {
            error!(
                running_for_ms = running_for.as_millis() as u64,
                ceiling_ms = ceiling.as_millis() as u64,
                "consolidation pass exceeded the stuck ceiling"
            );
            self.guard.force_release();
        }
    }

    async fn run_pass(&self, subject: &str, operation_id: &str) -> PassReport {
        let started_at = Utc::now();

        let mut loaded: Vec<LoadedSource> = Vec::with_capacity(self.loaders.len());
        for loader in &self.loaders {
            loaded.push(loader.load(&self.safe, started_at).await);
        }
        self.track_sources(&loaded);

        let sources: Vec<SourceSummary> = loaded
            .iter()
            .map(|l| SourceSummary {
                source: l.source,
                available: l.available,
                candidates: l.candidates.len(),
                rejections: l.rejections.clone(),
            })
            .collect();

        let merge = {
            let mut state = self.write_state();
            let merge = self.merger.merge(&loaded, &state.records, started_at);
            state.index = RecordIndex::build(merge.records.values());
            state.records = merge.records.clone();
            state.snapshot_dirty = true;
            state.last_consolidation = Some(started_at);
            state.unavailable_sources = loaded
                .iter()
                .filter(|l| !l.available)
                .map(|l| l.source)
                .collect();
            merge
        };
        let unresolved_relationships = self.read_state().index.unresolved;

        let persisted = self.persist_records().await;

        let mut report = PassReport {
            subject: subject.to_string(),
            operation_id: operation_id.to_string(),
            started_at,
            finished_at: Utc::now(),
            sources,
            created: merge.created,
            updated: merge.updated,
            unchanged: merge.unchanged,
            conflicts_logged: merge.conflicts_logged,
            enrichment_failures: merge.enrichment_failures,
            failed_keys: merge.failed_keys,
            total_records: merge.records.len(),
            unresolved_relationships,
            persisted,
        };

        let outcome = PassOutcome {
            subject: subject.to_string(),
            operation_id: operation_id.to_string(),
            records: report.total_records,
            conflicts: report.conflicts_logged,
            rejections: report.rejection_count(),
            sources_available: report.sources_available(),
            sources_total: report.sources.len(),
            persisted,
        };
        self.learning().record_pass_outcome(&outcome, Utc::now());
        self.persist_learning().await;

        events::consolidation_completed(
            subject,
            report.total_records,
            report.conflicts_logged,
            persisted,
        );
        report.finished_at = Utc::now();
        self.write_state().last_pass = Some(report.clone());
        report
    }

    fn track_sources(&self, loaded: &[LoadedSource]) {
        let mut degradation = self.degradation();
        for source in loaded {
            let component = source.source.as_str();
            if source.available {
                degradation.mark_recovered(component);
            } else {
                degradation.record(
                    component,
                    DegradationKind::SourceUnavailable,
                    "source unreachable or not ready",
                    "contributed no candidates",
                );
            }
        }
    }

    /// Write the record snapshot. Returns whether it landed.
    async fn persist_records(&self) -> bool {
        let _slot = self.persist_slot.lock().await;
        let snapshot: Vec<MasterRecord> = self.read_state().records.values().cloned().collect();

        match self.persistence.save_records(&snapshot).await {
            Ok(()) => {
                self.write_state().snapshot_dirty = false;
                self.degradation().mark_recovered(PERSISTENCE_COMPONENT);
                true
            }
            Err(e) => {
                log_error(
                    &e,
                    &[("records", &snapshot.len().to_string())],
                    "record snapshot write failed; memory stays authoritative",
                );
                self.write_state().snapshot_dirty = true;
                self.degradation().record(
                    PERSISTENCE_COMPONENT,
                    DegradationKind::PersistenceFailure,
                    &e.to_string(),
                    "keep records in memory, retry next pass",
                );
                false
            }
        }
    }

    /// Write pattern and effectiveness snapshots. Returns whether both landed.
    async fn persist_learning(&self) -> bool {
        let _slot = self.persist_slot.lock().await;
        let (patterns, records) = {
            let learning = self.learning();
            (learning.patterns().snapshot(), learning.records().to_vec())
        };

        let result = match self.persistence.save_patterns(&patterns).await {
            Ok(()) => self.persistence.save_effectiveness_records(&records).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                self.write_state().learning_dirty = false;
                self.degradation().mark_recovered(LEARNING_COMPONENT);
                true
            }
            Err(e) => {
                log_error(&e, &[], "learning snapshot write failed");
                self.write_state().learning_dirty = true;
                self.degradation().record(
                    LEARNING_COMPONENT,
                    DegradationKind::PersistenceFailure,
                    &e.to_string(),
                    "keep learning state in memory",
                );
                false
            }
        }
    }

    pub fn get_by_id(&self, id: &str) -> Option<MasterRecord> {
        let state = self.read_state();
        let key = state.index.by_id.get(id)?;
        state.records.get(key).cloned()
    }

    pub fn get_by_name(&self, name: &str) -> Option<MasterRecord> {
        self.read_state()
            .records
            .get(&normalize_identity(name))
            .cloned()
    }

    /// Records whose entity type matches, case-insensitively, ordered by id.
    pub fn get_all_by_type(&self, entity_type: &str) -> Vec<MasterRecord> {
        let state = self.read_state();
        state
            .index
            .ids_for_type(entity_type)
            .iter()
            .filter_map(|id| state.index.by_id.get(id))
            .filter_map(|key| state.records.get(key))
            .cloned()
            .collect()
    }

    /// Records `id` declares a relationship to.
    pub fn get_related(&self, id: &str) -> Vec<RelatedRecord> {
        let state = self.read_state();
        state
            .index
            .edges(id)
            .iter()
            .filter_map(|edge| {
                let key = state.index.by_id.get(&edge.target_id)?;
                let record = state.records.get(key)?;
                Some(RelatedRecord {
                    relation: edge.relation.clone(),
                    record: record.clone(),
                })
            })
            .collect()
    }

    /// Apply a manual edit, then persist best-effort.
    pub async fn update(&self, id: &str, patch: RecordPatch) -> CanonResult<MasterRecord> {
        let updated = {
            let mut state = self.write_state();
            let key = state
                .index
                .by_id
                .get(id)
                .cloned()
                .ok_or_else(|| RecordError::NotFound { id: id.to_string() })?;
            let current = state
                .records
                .get(&key)
                .ok_or_else(|| RecordError::NotFound { id: id.to_string() })?;

            let Some(updated) =
                apply_patch(current, &patch, self.config.sources.manual, Utc::now())?
            else {
                return Ok(current.clone());
            };
            state.records.insert(key, updated.clone());
            state.index = RecordIndex::build(state.records.values());
            state.snapshot_dirty = true;
            updated
        };

        info!(
            record_id = %updated.id,
            version = %updated.master_version,
            "record updated manually"
        );
        self.persist_records().await;
        Ok(updated)
    }

    /// Summarize a finished unit of work and learn from it.
    pub async fn record_unit_of_work(&self, unit: UnitOfWork) -> LongTermEffectivenessRecord {
        let span = learning_span!(unit.unit_id);
        let record = span.in_scope(|| self.learning().complete_unit(unit, Utc::now()));
        self.persist_learning().await;
        record
    }

    pub fn top_patterns(&self, category: PatternCategory, limit: usize) -> Vec<EffectivenessPattern> {
        self.learning()
            .top_patterns(category, limit)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn patterns_matching(&self, conditions: &[&str]) -> Vec<EffectivenessPattern> {
        self.learning()
            .patterns_matching(conditions)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn effectiveness_records(&self) -> Vec<LongTermEffectivenessRecord> {
        self.learning().records().to_vec()
    }

    /// Health summary with actionable recommendations.
    pub fn diagnose(&self) -> Diagnosis {
        let stats = self.safe.stats();
        let forced_releases = self.guard.statistics().total_forced;
        let queued_requests = self.queue().len();

        let state = self.read_state();
        let mut source_coverage: BTreeMap<String, usize> = SourceKind::ALL
            .iter()
            .map(|k| (k.as_str().to_string(), 0))
            .collect();
        let mut conflict_count = 0;
        for record in state.records.values() {
            conflict_count += record.conflict_resolutions.len();
            for kind in SourceKind::ALL {
                if record.has_source(kind) {
                    *source_coverage.entry(kind.as_str().to_string()).or_insert(0) += 1;
                }
            }
        }

        let snapshot = DiagnosisSnapshot {
            total_records: state.records.len(),
            conflict_count,
            source_coverage: source_coverage.clone(),
            unavailable_sources: state
                .unavailable_sources
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            unresolved_relationships: state.index.unresolved,
            rejected_payloads: state
                .last_pass
                .as_ref()
                .map(PassReport::rejection_count)
                .unwrap_or(0),
            snapshot_dirty: state.snapshot_dirty || state.learning_dirty,
            degraded_mode: state.degraded_mode,
            forced_releases,
            queued_requests,
            source_hit_rate: (stats.hits + stats.misses > 0).then(|| stats.hit_rate()),
            has_consolidated: state.last_consolidation.is_some(),
        };

        Diagnosis {
            total_records: snapshot.total_records,
            conflict_count,
            last_consolidation: state.last_consolidation,
            source_coverage,
            recommendations: generate_recommendations(&snapshot),
        }
    }

    pub fn get_status(&self) -> EngineStatus {
        let (pattern_count, effectiveness_records) = {
            let learning = self.learning();
            (learning.patterns().len(), learning.records().len())
        };
        let queued = self.queue().keys();
        let active_degradations = self.degradation().active().into_iter().cloned().collect();

        let state = self.read_state();
        EngineStatus {
            initialized: state.initialized,
            degraded_mode: state.degraded_mode,
            snapshot_dirty: state.snapshot_dirty,
            learning_dirty: state.learning_dirty,
            total_records: state.records.len(),
            pattern_count,
            effectiveness_records,
            guard: self.guard.status(),
            guard_statistics: self.guard.statistics(),
            operations: self.safe.stats(),
            queued,
            active_degradations,
            last_pass: state.last_pass.clone(),
        }
    }
}
