use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::source::SourceKind;

/// How a field-level disagreement was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// A deterministic textual rule picked the value.
    Auto,
    /// The higher-priority source won outright.
    Priority,
    /// Both values were combined.
    Merge,
    /// A caller edited the record.
    Manual,
}

/// Immutable audit entry for one divergent field.
///
/// Logged whenever two sources disagree, even when the rule keeps the
/// primary's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    /// Name of the divergent field.
    pub conflict_type: String,
    /// The winning side going in (the higher-priority source).
    pub source_a: SourceKind,
    pub source_b: SourceKind,
    /// `{"a": <value>, "b": <value>}`.
    pub conflict_data: serde_json::Value,
    /// Value the record ended up with.
    pub resolution: serde_json::Value,
    pub resolution_method: ResolutionMethod,
    pub resolved_at: DateTime<Utc>,
    pub resolved_by: String,
}
