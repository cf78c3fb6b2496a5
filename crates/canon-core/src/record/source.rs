use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a candidate came from.
///
/// Declaration order is the deterministic tie-break when two contributors
/// share a priority: primary before secondary before manual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Fast authoritative in-memory source.
    Primary,
    /// Slower file-backed durable source.
    Secondary,
    /// Edits applied through the record API.
    Manual,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [Self::Primary, Self::Secondary, Self::Manual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One contribution to a master record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationSource {
    pub source: SourceKind,
    pub source_id: String,
    pub last_updated: DateTime<Utc>,
    pub priority: i32,
    /// Advisory only; not used when ordering contributors.
    pub reliability: i32,
}
