//! Long-lived learning types: scored patterns and per-unit effectiveness
//! snapshots.

mod pattern;
mod record;

pub use pattern::{normalize_pattern_text, pattern_id, EffectivenessPattern, PatternCategory};
pub use record::{
    EffectivenessRecommendation, LongTermEffectivenessRecord, Priority, QualityTrend,
    TrendDirection,
};
