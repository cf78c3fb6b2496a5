//! EffectivenessTracker: completed units of work become long-term records
//! and pattern observations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use canon_core::config::LearningConfig;
use canon_core::effectiveness::{
    EffectivenessPattern, EffectivenessRecommendation, LongTermEffectivenessRecord,
    PatternCategory, Priority, TrendDirection,
};

use crate::patterns::{Observation, PatternStore};
use crate::trend::classify_trend;

/// A piece of text with the effectiveness it achieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredText {
    pub text: String,
    pub effectiveness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSolution {
    pub problem: String,
    pub solution: String,
    pub effectiveness: f64,
}

/// Everything recorded about one completed unit of work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitOfWork {
    pub unit_id: String,
    pub label: String,
    /// Quality score per sub-unit, in order, on the configured score scale.
    pub sub_unit_scores: Vec<f64>,
    /// Effectiveness samples (`0.0..=1.0`) per subsystem.
    pub subsystem_scores: BTreeMap<String, Vec<f64>>,
    pub effective_prompts: Vec<ScoredText>,
    pub strategies: Vec<ScoredText>,
    pub problem_solutions: Vec<ProblemSolution>,
    /// Conditions attached to every pattern observed from this unit.
    pub conditions: Vec<String>,
}

/// What a consolidation pass achieved, as seen by the learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassOutcome {
    pub subject: String,
    pub operation_id: String,
    pub records: usize,
    pub conflicts: usize,
    pub rejections: usize,
    pub sources_available: usize,
    pub sources_total: usize,
    pub persisted: bool,
}

impl PassOutcome {
    /// Share of sources that answered, less a penalty for an unpersisted
    /// snapshot.
    pub fn score(&self) -> f64 {
        let availability = if self.sources_total == 0 {
            0.0
        } else {
            self.sources_available as f64 / self.sources_total as f64
        };
        let penalty = if self.persisted { 0.0 } else { 0.25 };
        (availability - penalty).clamp(0.0, 1.0)
    }
}

/// Owns the pattern store and the append-only effectiveness history.
#[derive(Debug, Clone)]
pub struct EffectivenessTracker {
    config: LearningConfig,
    patterns: PatternStore,
    records: Vec<LongTermEffectivenessRecord>,
}

impl EffectivenessTracker {
    pub fn new(config: LearningConfig) -> Self {
        let patterns = PatternStore::new(config.max_cases_per_pattern, config.high_effectiveness);
        Self {
            config,
            patterns,
            records: Vec::new(),
        }
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Replace state with persisted snapshots.
    pub fn restore(
        &mut self,
        patterns: Vec<EffectivenessPattern>,
        records: Vec<LongTermEffectivenessRecord>,
    ) {
        self.patterns.restore(patterns);
        self.records = records;
        info!(
            patterns = self.patterns.len(),
            records = self.records.len(),
            "effectiveness state restored"
        );
    }

    /// Summarize a finished unit of work and learn from its patterns.
    pub fn complete_unit(&mut self, unit: UnitOfWork, now: DateTime<Utc>) -> LongTermEffectivenessRecord {
        let subsystem_scores: BTreeMap<String, f64> = unit
            .subsystem_scores
            .iter()
            .filter_map(|(name, samples)| {
                let valid: Vec<f64> = samples.iter().copied().filter(|s| s.is_finite()).collect();
                if valid.is_empty() {
                    return None;
                }
                let avg = valid.iter().sum::<f64>() / valid.len() as f64;
                Some((name.clone(), avg.clamp(0.0, 1.0)))
            })
            .collect();

        let overall_effectiveness = if subsystem_scores.is_empty() {
            0.0
        } else {
            subsystem_scores.values().sum::<f64>() / subsystem_scores.len() as f64
        };

        let quality_trend = classify_trend(
            &unit.sub_unit_scores,
            self.config.trend_threshold,
            self.config.score_scale,
        );

        let mut lessons = Vec::new();
        let mut recommendations = Vec::new();

        match quality_trend.direction {
            TrendDirection::Improving => lessons.push(format!(
                "quality improved across {} (strength {:.2})",
                unit.label, quality_trend.strength
            )),
            TrendDirection::Declining => {
                lessons.push(format!(
                    "quality declined across {} (strength {:.2})",
                    unit.label, quality_trend.strength
                ));
                recommendations.push(EffectivenessRecommendation {
                    priority: Priority::High,
                    subsystem: "overall".to_string(),
                    message: "quality is declining; revisit the approach used in later sub-units"
                        .to_string(),
                });
            }
            TrendDirection::Stable => {}
        }

        for (subsystem, &score) in &subsystem_scores {
            if score < self.config.low_effectiveness {
                lessons.push(format!("{subsystem} underperformed ({score:.2})"));
                let priority = if score < self.config.low_effectiveness / 2.0 {
                    Priority::High
                } else {
                    Priority::Medium
                };
                recommendations.push(EffectivenessRecommendation {
                    priority,
                    subsystem: subsystem.clone(),
                    message: format!("improve {subsystem}: average effectiveness {score:.2}"),
                });
            } else if score >= self.config.high_effectiveness {
                lessons.push(format!("{subsystem} was effective ({score:.2})"));
            }
        }

        if let Some(best) = unit
            .strategies
            .iter()
            .filter(|s| s.effectiveness >= self.config.high_effectiveness)
            .max_by(|a, b| a.effectiveness.total_cmp(&b.effectiveness))
        {
            recommendations.push(EffectivenessRecommendation {
                priority: Priority::Low,
                subsystem: "strategy".to_string(),
                message: format!("reuse strategy: {}", best.text),
            });
        }

        // Stable sort keeps insertion order within a priority.
        recommendations.sort_by_key(|r| r.priority);

        let observed = self.observe_unit(&unit, now);

        let record = LongTermEffectivenessRecord {
            id: uuid::Uuid::new_v4().to_string(),
            unit_id: unit.unit_id,
            label: unit.label,
            recorded_at: now,
            subsystem_scores,
            overall_effectiveness,
            quality_trend,
            lessons,
            recommendations,
        };
        info!(
            unit_id = %record.unit_id,
            overall = record.overall_effectiveness,
            trend = ?record.quality_trend.direction,
            patterns_observed = observed,
            "unit of work recorded"
        );
        self.records.push(record.clone());
        record
    }

    fn observe_unit(&mut self, unit: &UnitOfWork, now: DateTime<Utc>) -> usize {
        let mut observations = Vec::new();
        for prompt in &unit.effective_prompts {
            observations.push((PatternCategory::Prompt, prompt.text.clone(), prompt.effectiveness));
        }
        for strategy in &unit.strategies {
            observations.push((
                PatternCategory::Strategy,
                strategy.text.clone(),
                strategy.effectiveness,
            ));
        }
        for pair in &unit.problem_solutions {
            observations.push((
                PatternCategory::ProblemSolution,
                format!("{} => {}", pair.problem, pair.solution),
                pair.effectiveness,
            ));
        }

        let mut count = 0;
        for (category, text, effectiveness) in observations {
            if text.trim().is_empty() {
                continue;
            }
            count += 1;
            self.patterns.observe(
                Observation {
                    category,
                    text,
                    conditions: unit.conditions.clone(),
                    effectiveness,
                    case: unit.unit_id.clone(),
                },
                now,
            );
        }
        count
    }

    /// Learn from a consolidation pass. The pattern is keyed by subject.
    pub fn record_pass_outcome(&mut self, outcome: &PassOutcome, now: DateTime<Utc>) -> &EffectivenessPattern {
        let mut conditions = vec![format!("subject:{}", outcome.subject)];
        if outcome.sources_available < outcome.sources_total {
            conditions.push("degraded-sources".to_string());
        }
        if !outcome.persisted {
            conditions.push("unpersisted".to_string());
        }
        if outcome.conflicts > 0 {
            conditions.push("conflicts".to_string());
        }
        debug!(
            subject = %outcome.subject,
            score = outcome.score(),
            "recording consolidation outcome"
        );
        self.patterns.observe(
            Observation {
                category: PatternCategory::Consolidation,
                text: format!("consolidate {}", outcome.subject),
                conditions,
                effectiveness: outcome.score(),
                case: outcome.operation_id.clone(),
            },
            now,
        )
    }

    pub fn patterns(&self) -> &PatternStore {
        &self.patterns
    }

    pub fn top_patterns(&self, category: PatternCategory, limit: usize) -> Vec<&EffectivenessPattern> {
        self.patterns.top_patterns(category, limit)
    }

    pub fn patterns_matching(&self, conditions: &[&str]) -> Vec<&EffectivenessPattern> {
        self.patterns.patterns_matching(conditions)
    }

    pub fn records(&self) -> &[LongTermEffectivenessRecord] {
        &self.records
    }
}

impl Default for EffectivenessTracker {
    fn default() -> Self {
        Self::new(LearningConfig::default())
    }
}
