use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::master::EntityKind;

/// Domain payload attached to every record.
///
/// Produced by enrichment; always schema-valid, even when enrichment failed
/// and [`RecordExtensions::minimal`] was used instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordExtensions {
    pub personality: Personality,
    pub state: EntityState,
    pub history: Vec<HistoryEntry>,
    pub statistics: RecordStatistics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Personality {
    pub traits: Vec<String>,
    pub keywords: Vec<String>,
    pub temperament: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityState {
    pub status: String,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub event: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordStatistics {
    pub consolidation_count: u64,
    pub source_count: usize,
    pub conflict_count: usize,
    pub relationship_count: usize,
}

impl RecordExtensions {
    /// Smallest valid payload for a kind. Used when enrichment fails.
    pub fn minimal(kind: EntityKind) -> Self {
        let status = match kind {
            EntityKind::Character => "active",
            EntityKind::Location => "known",
            EntityKind::Organization => "operating",
        };
        Self {
            personality: Personality {
                temperament: "unknown".to_string(),
                ..Default::default()
            },
            state: EntityState {
                status: status.to_string(),
                condition: "unknown".to_string(),
            },
            history: Vec::new(),
            statistics: RecordStatistics::default(),
        }
    }
}
