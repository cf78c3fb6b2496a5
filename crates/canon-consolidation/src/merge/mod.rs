//! Merger: one master record per identity key, with an audit log.
//!
//! Keys seen in no source this pass keep their existing record untouched.
//! A key whose resolution fails keeps its existing record as well; the
//! failure is logged and reported, and the pass goes on. Fields edited
//! through `update` keep their manual values, extensions included.

mod manual;
mod resolver;

pub use resolver::{ConflictResolver, RecordChange, Resolved};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use canon_core::record::RecordExtensions;
use canon_core::traits::IEnricher;
use canon_core::{Candidate, MasterRecord};
use canon_observability::log_error;

use crate::loaders::LoadedSource;

/// What a merge produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
    /// Every record after the merge, by identity key.
    pub records: BTreeMap<String, MasterRecord>,
    /// Ids of records created this pass.
    pub created: Vec<String>,
    /// Ids of records whose version was bumped.
    pub updated: Vec<String>,
    pub unchanged: usize,
    pub conflicts_logged: usize,
    /// Ids of records that fell back to minimal extensions.
    pub enrichment_failures: Vec<String>,
    /// Identity keys whose resolution failed.
    pub failed_keys: Vec<String>,
}

/// Combines resolution and enrichment over every identity key.
#[derive(Clone)]
pub struct Merger {
    resolver: ConflictResolver,
    enricher: Arc<dyn IEnricher>,
}

impl Merger {
    pub fn new(resolver: ConflictResolver, enricher: Arc<dyn IEnricher>) -> Self {
        Self { resolver, enricher }
    }

    pub fn resolver(&self) -> &ConflictResolver {
        &self.resolver
    }

    /// Merge loaded sources over `existing`. Deterministic for equal inputs
    /// and `now`.
    pub fn merge(
        &self,
        sources: &[LoadedSource],
        existing: &BTreeMap<String, MasterRecord>,
        now: DateTime<Utc>,
    ) -> MergeReport {
        let mut by_key: BTreeMap<&str, Vec<&Candidate>> = BTreeMap::new();
        for loaded in sources {
            for candidate in loaded.candidates.values() {
                by_key
                    .entry(candidate.identity_key.as_str())
                    .or_default()
                    .push(candidate);
            }
        }

        let mut report = MergeReport {
            records: existing.clone(),
            ..Default::default()
        };

        for (key, contributors) in by_key {
            let current = existing.get(key);
            let resolved = match self.resolver.resolve(key, &contributors, current, now) {
                Ok(Some(resolved)) => resolved,
                Ok(None) => continue,
                Err(e) => {
                    log_error(&e, &[("identity_key", key)], "record resolution failed");
                    report.failed_keys.push(key.to_string());
                    continue;
                }
            };

            let Resolved {
                mut record,
                change,
                new_conflicts,
            } = resolved;

            let enriched = match self.enricher.enrich(&record) {
                Ok(extensions) => extensions,
                Err(e) => {
                    warn!(
                        record_id = %record.id,
                        error = %e,
                        "enrichment failed, using minimal extensions"
                    );
                    report.enrichment_failures.push(record.id.clone());
                    RecordExtensions::minimal(record.kind)
                }
            };
            let extensions = match manual::overlay_extensions(&record, &enriched) {
                Ok(Some(edited)) => edited,
                Ok(None) => enriched,
                Err(e) => {
                    log_error(
                        &e,
                        &[("record_id", record.id.as_str())],
                        "manual extensions could not be reapplied",
                    );
                    enriched
                }
            };
            record.extensions = extensions;

            debug!(
                record_id = %record.id,
                version = %record.master_version,
                change = ?change,
                new_conflicts,
                "record merged"
            );
            report.conflicts_logged += new_conflicts;
            match change {
                RecordChange::Created => report.created.push(record.id.clone()),
                RecordChange::Updated => report.updated.push(record.id.clone()),
                RecordChange::Unchanged => report.unchanged += 1,
            }
            report.records.insert(key.to_string(), record);
        }
        report
    }
}
