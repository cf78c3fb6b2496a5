//! Enrichment: derive a record's extension payload from its merged fields.

mod inference;
mod keywords;

pub use inference::{infer_condition, infer_status, infer_temperament};
pub use keywords::extract_keywords;

use canon_core::config::ConsolidationConfig;
use canon_core::errors::EnrichmentError;
use canon_core::record::{
    EntityState, HistoryEntry, Personality, RecordExtensions, RecordStatistics,
};
use canon_core::traits::IEnricher;
use canon_core::MasterRecord;

/// Default enricher: keyword extraction plus inference tables keyed by
/// entity type.
///
/// History carries forward from the previous payload and gains one entry per
/// new version. Deterministic for a given record.
#[derive(Debug, Clone)]
pub struct HeuristicEnricher {
    max_keywords: usize,
    max_history: usize,
    max_chars: usize,
}

impl HeuristicEnricher {
    pub fn new(config: &ConsolidationConfig) -> Self {
        Self {
            max_keywords: config.max_keywords,
            max_history: config.max_history_entries.max(1),
            max_chars: config.max_enrichment_chars,
        }
    }
}

impl Default for HeuristicEnricher {
    fn default() -> Self {
        Self::new(&ConsolidationConfig::default())
    }
}

impl IEnricher for HeuristicEnricher {
    fn enrich(&self, record: &MasterRecord) -> Result<RecordExtensions, EnrichmentError> {
        let len = record.description.chars().count();
        if len > self.max_chars {
            return Err(EnrichmentError::TextTooLong {
                len,
                max: self.max_chars,
            });
        }

        let keywords = extract_keywords(&record.description, self.max_keywords)?;
        let previous = &record.extensions;

        let mut history = previous.history.clone();
        let event = format!("consolidated v{}", record.master_version);
        if history.last().map(|h| &h.event) != Some(&event) {
            history.push(HistoryEntry {
                at: record.last_consolidated,
                event,
            });
        }
        if history.len() > self.max_history {
            let excess = history.len() - self.max_history;
            history.drain(..excess);
        }

        Ok(RecordExtensions {
            personality: Personality {
                traits: record.traits.clone(),
                temperament: infer_temperament(record.kind, &record.entity_type, &record.traits)
                    .to_string(),
                keywords,
            },
            state: EntityState {
                status: infer_status(record.kind, &record.entity_type, &record.description)
                    .to_string(),
                condition: infer_condition(&record.description).to_string(),
            },
            history,
            statistics: RecordStatistics {
                consolidation_count: previous.statistics.consolidation_count + 1,
                source_count: record.consolidated_from.len(),
                conflict_count: record.conflict_resolutions.len(),
                relationship_count: record.relationships.len(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canon_core::record::master_id_for;
    use canon_core::EntityKind;
    use chrono::{TimeZone, Utc};

    fn record(description: &str) -> MasterRecord {
        let at = Utc.with_ymd_and_hms(2026, 2, 2, 2, 2, 2).unwrap();
        MasterRecord {
            id: master_id_for("vex"),
            identity_key: "vex".to_string(),
            name: "Vex".to_string(),
            kind: EntityKind::Character,
            entity_type: "Villain".to_string(),
            description: description.to_string(),
            traits: vec!["cunning".to_string()],
            relationships: Vec::new(),
            master_version: "1.0.0".to_string(),
            consolidated_from: Vec::new(),
            conflict_resolutions: Vec::new(),
            extensions: RecordExtensions::minimal(EntityKind::Character),
            created_at: at,
            last_consolidated: at,
        }
    }

    #[test]
    fn derives_payload_from_fields() {
        let enricher = HeuristicEnricher::default();
        let ext = enricher
            .enrich(&record("A wounded smuggler who smuggles relics past the harbor watch."))
            .unwrap();
        assert_eq!(ext.personality.temperament, "hostile");
        assert_eq!(ext.state.condition, "injured");
        assert!(ext.personality.keywords.contains(&"smuggler".to_string()));
        assert!(!ext.personality.keywords.contains(&"the".to_string()));
        assert_eq!(ext.history.len(), 1);
        assert_eq!(ext.statistics.consolidation_count, 1);
    }

    #[test]
    fn same_version_does_not_grow_history() {
        let enricher = HeuristicEnricher::default();
        let mut rec = record("Quiet.");
        rec.extensions = enricher.enrich(&rec).unwrap();
        let again = enricher.enrich(&rec).unwrap();
        assert_eq!(again.history.len(), 1);
        assert_eq!(again.statistics.consolidation_count, 2);

        rec.extensions = again;
        rec.master_version = "1.0.1".to_string();
        assert_eq!(enricher.enrich(&rec).unwrap().history.len(), 2);
    }

    #[test]
    fn oversized_text_is_refused() {
        let enricher = HeuristicEnricher::new(&ConsolidationConfig {
            max_enrichment_chars: 5,
            ..Default::default()
        });
        assert!(matches!(
            enricher.enrich(&record("far too long")),
            Err(EnrichmentError::TextTooLong { len: 12, max: 5 })
        ));
    }
}
