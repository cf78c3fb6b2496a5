use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::conflict::ConflictResolution;
use super::extensions::RecordExtensions;
use super::source::{ConsolidationSource, SourceKind};

/// Broad shape of the entity a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Character,
    Location,
    Organization,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Location => "location",
            Self::Organization => "organization",
        }
    }
}

/// A relationship declared by a source, addressed by the target's name.
///
/// Names are resolved to ids by the index builder on every pass, so records
/// never hold references to each other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeclaredRelationship {
    pub target: String,
    #[serde(default = "default_relation")]
    pub relation: String,
}

fn default_relation() -> String {
    "related".to_string()
}

/// The canonical representation of one logical entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterRecord {
    /// Deterministic id derived from `identity_key`.
    pub id: String,
    /// Normalized name; exactly one record exists per key.
    pub identity_key: String,
    pub name: String,
    pub kind: EntityKind,
    /// Categorical type tag (role, location category, ...).
    pub entity_type: String,
    pub description: String,
    pub traits: Vec<String>,
    pub relationships: Vec<DeclaredRelationship>,
    /// `major.minor.patch`; patch increments on every update.
    pub master_version: String,
    /// Contributors, highest priority first.
    pub consolidated_from: Vec<ConsolidationSource>,
    /// Append-only audit log.
    pub conflict_resolutions: Vec<ConflictResolution>,
    /// Domain payload the merger treats as opaque.
    pub extensions: RecordExtensions,
    pub created_at: DateTime<Utc>,
    pub last_consolidated: DateTime<Utc>,
}

impl MasterRecord {
    /// Whether any contributor came from `kind`.
    pub fn has_source(&self, kind: SourceKind) -> bool {
        self.consolidated_from.iter().any(|s| s.source == kind)
    }

    /// Compare everything a merge can change, ignoring timestamps and the
    /// audit log. Contributors compare by source and source id only.
    pub fn content_eq(&self, other: &Self) -> bool {
        let contributors = |r: &Self| -> Vec<(SourceKind, String)> {
            r.consolidated_from
                .iter()
                .map(|s| (s.source, s.source_id.clone()))
                .collect()
        };
        self.name == other.name
            && self.kind == other.kind
            && self.entity_type == other.entity_type
            && self.description == other.description
            && self.traits == other.traits
            && self.relationships == other.relationships
            && contributors(self) == contributors(other)
    }
}

/// Partial update accepted by the record API. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub entity_type: Option<String>,
    pub description: Option<String>,
    pub traits: Option<Vec<String>>,
    pub relationships: Option<Vec<DeclaredRelationship>>,
    pub extensions: Option<RecordExtensions>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
