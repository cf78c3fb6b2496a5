use serde::{Deserialize, Serialize};

use super::defaults;

/// Effectiveness tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Half-to-half mean difference that counts as a trend.
    pub trend_threshold: f64,
    /// Upper bound of the quality scale (scores run 0..=scale).
    pub score_scale: f64,
    /// Success or failure cases kept per pattern.
    pub max_cases_per_pattern: usize,
    /// Subsystem average below this produces a lesson and a recommendation.
    pub low_effectiveness: f64,
    /// Observations at or above this count as success cases.
    pub high_effectiveness: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            trend_threshold: defaults::DEFAULT_TREND_THRESHOLD,
            score_scale: defaults::DEFAULT_SCORE_SCALE,
            max_cases_per_pattern: defaults::DEFAULT_MAX_CASES_PER_PATTERN,
            low_effectiveness: defaults::DEFAULT_LOW_EFFECTIVENESS,
            high_effectiveness: defaults::DEFAULT_HIGH_EFFECTIVENESS,
        }
    }
}
