//! Actionable recommendations based on engine health.
//!
//! Examples: "secondary source unavailable", "12 relationship targets do not
//! resolve".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Severity of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// An actionable recommendation surfaced through `diagnose()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub message: String,
    pub action: String,
}

/// Everything the recommendation rules look at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisSnapshot {
    pub total_records: usize,
    pub conflict_count: usize,
    /// Records per contributing source name.
    pub source_coverage: BTreeMap<String, usize>,
    pub unavailable_sources: Vec<String>,
    pub unresolved_relationships: usize,
    pub rejected_payloads: usize,
    /// A persisted snapshot is behind the in-memory state.
    pub snapshot_dirty: bool,
    /// Engine started without its persisted snapshot.
    pub degraded_mode: bool,
    pub forced_releases: u64,
    pub queued_requests: usize,
    /// SafeOperation hit rate, `None` before any call.
    pub source_hit_rate: Option<f64>,
    pub has_consolidated: bool,
}

/// Generate recommendations, most severe first.
pub fn generate(snapshot: &DiagnosisSnapshot) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    if snapshot.degraded_mode {
        recs.push(Recommendation {
            severity: Severity::Critical,
            message: "engine started without its persisted snapshot".into(),
            action: "check the durable store and re-run initialize".into(),
        });
    }

    if snapshot.snapshot_dirty {
        recs.push(Recommendation {
            severity: Severity::Warning,
            message: "latest records are not persisted".into(),
            action: "the next consolidation pass retries the write; check store health".into(),
        });
    }

    for source in &snapshot.unavailable_sources {
        recs.push(Recommendation {
            severity: Severity::Warning,
            message: format!("{source} source unavailable during the last pass"),
            action: format!("check the {source} source and re-run consolidation"),
        });
    }

    if snapshot.forced_releases > 0 {
        recs.push(Recommendation {
            severity: Severity::Warning,
            message: format!(
                "{} consolidation pass(es) were force-released",
                snapshot.forced_releases
            ),
            action: "investigate slow or hanging sources".into(),
        });
    }

    if let Some(rate) = snapshot.source_hit_rate {
        if rate < 0.5 {
            recs.push(Recommendation {
                severity: Severity::Warning,
                message: format!("source call success rate is {:.0}%", rate * 100.0),
                action: "review source timeouts and retry settings".into(),
            });
        }
    }

    if snapshot.unresolved_relationships > 0 {
        let severity = if snapshot.unresolved_relationships > 10 {
            Severity::Warning
        } else {
            Severity::Info
        };
        recs.push(Recommendation {
            severity,
            message: format!(
                "{} relationship targets do not resolve to a record",
                snapshot.unresolved_relationships
            ),
            action: "add the missing entities or fix the target names".into(),
        });
    }

    if snapshot.rejected_payloads > 0 {
        recs.push(Recommendation {
            severity: Severity::Info,
            message: format!("{} source payloads were rejected", snapshot.rejected_payloads),
            action: "fix the malformed source entries".into(),
        });
    }

    if snapshot.total_records > 0 && snapshot.conflict_count > snapshot.total_records {
        recs.push(Recommendation {
            severity: Severity::Info,
            message: format!(
                "{} conflicts across {} records",
                snapshot.conflict_count, snapshot.total_records
            ),
            action: "align the sources to reduce divergence".into(),
        });
    }

    if snapshot.queued_requests > 0 {
        recs.push(Recommendation {
            severity: Severity::Info,
            message: format!("{} consolidation request(s) queued", snapshot.queued_requests),
            action: "drain the queue".into(),
        });
    }

    if !snapshot.has_consolidated {
        recs.push(Recommendation {
            severity: Severity::Info,
            message: "no consolidation pass has completed".into(),
            action: "run consolidate".into(),
        });
    }

    recs.sort_by(|a, b| b.severity.cmp(&a.severity));
    recs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_snapshot_has_no_recommendations() {
        let snapshot = DiagnosisSnapshot {
            total_records: 3,
            conflict_count: 1,
            source_hit_rate: Some(1.0),
            has_consolidated: true,
            ..Default::default()
        };
        assert!(generate(&snapshot).is_empty());
    }

    #[test]
    fn most_severe_first() {
        let snapshot = DiagnosisSnapshot {
            degraded_mode: true,
            unresolved_relationships: 2,
            unavailable_sources: vec!["secondary".into()],
            has_consolidated: true,
            ..Default::default()
        };
        let recs = generate(&snapshot);
        let severities: Vec<_> = recs.iter().map(|r| r.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Critical, Severity::Warning, Severity::Info]
        );
        assert!(recs[1].message.contains("secondary"));
    }

    #[test]
    fn many_unresolved_targets_escalate() {
        let snapshot = DiagnosisSnapshot {
            unresolved_relationships: 11,
            has_consolidated: true,
            ..Default::default()
        };
        assert_eq!(generate(&snapshot)[0].severity, Severity::Warning);
    }
}
