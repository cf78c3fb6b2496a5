use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a quality series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
}

/// Half-over-half comparison of a scalar series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityTrend {
    pub direction: TrendDirection,
    /// `0.0..=1.0`. For a trend: size of the shift. For stable: how flat.
    pub strength: f64,
    pub first_half_mean: f64,
    pub second_half_mean: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessRecommendation {
    pub priority: Priority,
    pub subsystem: String,
    pub message: String,
}

/// Snapshot of one completed unit of work. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTermEffectivenessRecord {
    pub id: String,
    pub unit_id: String,
    pub label: String,
    pub recorded_at: DateTime<Utc>,
    /// Average effectiveness per subsystem, `0.0..=1.0`.
    pub subsystem_scores: BTreeMap<String, f64>,
    pub overall_effectiveness: f64,
    pub quality_trend: QualityTrend,
    pub lessons: Vec<String>,
    /// Sorted high priority first.
    pub recommendations: Vec<EffectivenessRecommendation>,
}
