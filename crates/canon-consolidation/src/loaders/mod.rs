//! Source loaders: fetch and validate candidates, one source at a time.
//!
//! A loader never fails. Whatever goes wrong is folded into the returned
//! [`LoadedSource`]: unreachable sources come back empty with
//! `available = false`, invalid payloads come back as rejections.

mod durable;
mod primary;

pub use durable::DurableLoader;
pub use primary::PrimaryLoader;

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use canon_core::errors::SourceError;
use canon_core::{Candidate, Rejection, SourceKind, SourceRecord};
use canon_observability::tracing_setup::events;
use canon_resilience::SafeOperation;

/// Everything one source contributed to a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedSource {
    pub source: SourceKind,
    /// Accepted candidates by source id. At most one per identity key.
    pub candidates: BTreeMap<String, Candidate>,
    pub rejections: Vec<Rejection>,
    pub available: bool,
}

impl LoadedSource {
    /// Empty result for a source that could not be reached.
    pub fn unavailable(source: SourceKind) -> Self {
        Self {
            source,
            candidates: BTreeMap::new(),
            rejections: Vec::new(),
            available: false,
        }
    }

    /// Validate raw payloads into candidates.
    ///
    /// Duplicate source ids keep the first payload. Duplicate identity keys
    /// keep the most recently updated candidate, ties going to the smaller
    /// source id; the losers are recorded as rejections.
    pub fn from_payloads(
        source: SourceKind,
        payloads: Vec<serde_json::Value>,
        fallback_time: DateTime<Utc>,
    ) -> Self {
        let mut loaded = Self {
            source,
            candidates: BTreeMap::new(),
            rejections: Vec::new(),
            available: true,
        };

        let mut accepted: BTreeMap<String, Candidate> = BTreeMap::new();
        for payload in payloads {
            match SourceRecord::parse(payload) {
                Ok(record) => {
                    let candidate = record.into_candidate(source, fallback_time);
                    if accepted.contains_key(&candidate.source_id) {
                        loaded.reject(&candidate.source_id, "duplicate source id".to_string());
                        continue;
                    }
                    accepted.insert(candidate.source_id.clone(), candidate);
                }
                Err(e) => {
                    let source_id = match &e {
                        SourceError::InvalidPayload { source_id, .. } => source_id.clone(),
                        _ => "<unknown>".to_string(),
                    };
                    loaded.reject(&source_id, e.to_string());
                }
            }
        }

        // Iterating by source id makes the tie-break on equal timestamps
        // fall to the smaller id.
        let mut winners: HashMap<String, String> = HashMap::new();
        for candidate in accepted.values() {
            let keep_current = winners
                .get(&candidate.identity_key)
                .is_some_and(|current| accepted[current].last_updated >= candidate.last_updated);
            if !keep_current {
                winners.insert(candidate.identity_key.clone(), candidate.source_id.clone());
            }
        }

        for (source_id, candidate) in accepted {
            if winners.get(&candidate.identity_key) == Some(&source_id) {
                loaded.candidates.insert(source_id, candidate);
            } else {
                let reason = format!(
                    "superseded by a newer record for identity {:?}",
                    candidate.identity_key
                );
                loaded.reject(&source_id, reason);
            }
        }
        loaded
    }

    pub(crate) fn reject(&mut self, source_id: &str, reason: String) {
        events::payload_rejected(self.source.as_str(), source_id, &reason);
        self.rejections.push(Rejection {
            source: self.source,
            source_id: source_id.to_string(),
            reason,
        });
    }
}

/// Fetches the full candidate set of one source.
#[async_trait]
pub trait ISourceLoader: Send + Sync {
    fn source(&self) -> SourceKind;

    /// Load through `safe`. `now` stamps candidates without `updated_at`.
    async fn load(&self, safe: &SafeOperation, now: DateTime<Utc>) -> LoadedSource;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(hour: u32) -> String {
        Utc.with_ymd_and_hms(2026, 1, 1, hour, 0, 0)
            .unwrap()
            .to_rfc3339()
    }

    #[test]
    fn newest_duplicate_identity_wins() {
        let payloads = vec![
            json!({"kind": "character", "id": "a", "name": "Mira Vale", "updated_at": at(1)}),
            json!({"kind": "character", "id": "b", "name": "mira-vale", "updated_at": at(3)}),
            json!({"kind": "character", "id": "c", "name": "MIRA VALE", "updated_at": at(2)}),
        ];
        let loaded = LoadedSource::from_payloads(SourceKind::Primary, payloads, Utc::now());
        assert_eq!(loaded.candidates.keys().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(loaded.rejections.len(), 2);
    }

    #[test]
    fn equal_timestamps_prefer_smaller_id() {
        let payloads = vec![
            json!({"kind": "location", "id": "z", "name": "Harbor", "updated_at": at(1)}),
            json!({"kind": "location", "id": "m", "name": "harbor", "updated_at": at(1)}),
        ];
        let loaded = LoadedSource::from_payloads(SourceKind::Secondary, payloads, Utc::now());
        assert!(loaded.candidates.contains_key("m"));
        assert_eq!(loaded.rejections[0].source_id, "z");
    }

    #[test]
    fn invalid_payloads_become_rejections() {
        let payloads = vec![
            json!({"kind": "character", "id": "ok", "name": "Bren"}),
            json!({"kind": "dragon", "id": "bad", "name": "Smaug"}),
            json!({"kind": "character", "id": "ok", "name": "Other"}),
            json!("not an object"),
        ];
        let loaded = LoadedSource::from_payloads(SourceKind::Primary, payloads, Utc::now());
        assert_eq!(loaded.candidates.len(), 1);
        let ids: Vec<_> = loaded.rejections.iter().map(|r| r.source_id.as_str()).collect();
        assert_eq!(ids, vec!["bad", "ok", "<unknown>"]);
        assert!(loaded.available);
    }
}
