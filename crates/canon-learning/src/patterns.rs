//! Scored pattern store keyed by content hash.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use canon_core::effectiveness::{
    normalize_pattern_text, pattern_id, EffectivenessPattern, PatternCategory,
};

/// One scored observation of a behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub category: PatternCategory,
    pub text: String,
    pub conditions: Vec<String>,
    /// `0.0..=1.0`; clamped on entry.
    pub effectiveness: f64,
    /// Case label (usually the unit or operation id).
    pub case: String,
}

/// Patterns by id. Patterns are created on first observation and only ever
/// updated afterwards.
#[derive(Debug, Clone)]
pub struct PatternStore {
    patterns: BTreeMap<String, EffectivenessPattern>,
    max_cases: usize,
    success_threshold: f64,
}

impl PatternStore {
    pub fn new(max_cases: usize, success_threshold: f64) -> Self {
        Self {
            patterns: BTreeMap::new(),
            max_cases: max_cases.max(1),
            success_threshold,
        }
    }

    /// Rebuild from a persisted snapshot. Later duplicates replace earlier.
    pub fn restore(&mut self, patterns: Vec<EffectivenessPattern>) {
        self.patterns = patterns.into_iter().map(|p| (p.id.clone(), p)).collect();
    }

    /// Create or update the pattern for this observation.
    ///
    /// Updates use `effectiveness = (old + new) / 2` and bump
    /// `usage_frequency`. The case lands in `success_cases` when the score
    /// reaches the success threshold, in `failure_cases` otherwise; both
    /// lists keep only the most recent cases. Conditions describe the latest
    /// observation only.
    pub fn observe(&mut self, observation: Observation, now: DateTime<Utc>) -> &EffectivenessPattern {
        let id = pattern_id(observation.category, &observation.text);
        let score = if observation.effectiveness.is_finite() {
            observation.effectiveness.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let success = score >= self.success_threshold;
        let max_cases = self.max_cases;

        let pattern = self
            .patterns
            .entry(id.clone())
            .and_modify(|p| {
                p.effectiveness = (p.effectiveness + score) / 2.0;
                p.usage_frequency += 1;
                p.last_updated = now;
            })
            .or_insert_with(|| EffectivenessPattern {
                id: id.clone(),
                category: observation.category,
                description: normalize_pattern_text(&observation.text),
                conditions: Vec::new(),
                effectiveness: score,
                usage_frequency: 1,
                success_cases: Vec::new(),
                failure_cases: Vec::new(),
                last_updated: now,
            });

        let mut conditions: Vec<String> = observation
            .conditions
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        conditions.sort();
        conditions.dedup();
        pattern.conditions = conditions;

        let cases = if success {
            &mut pattern.success_cases
        } else {
            &mut pattern.failure_cases
        };
        cases.push(observation.case);
        if cases.len() > max_cases {
            let excess = cases.len() - max_cases;
            cases.drain(..excess);
        }

        debug!(
            pattern_id = %id,
            category = pattern.category.as_str(),
            effectiveness = pattern.effectiveness,
            usage_frequency = pattern.usage_frequency,
            "pattern observed"
        );
        pattern
    }

    pub fn get(&self, id: &str) -> Option<&EffectivenessPattern> {
        self.patterns.get(id)
    }

    /// Look up the pattern an observation of `text` would update.
    pub fn find(&self, category: PatternCategory, text: &str) -> Option<&EffectivenessPattern> {
        self.patterns.get(&pattern_id(category, text))
    }

    /// Highest-scoring patterns of a category. Ties go to the more used
    /// pattern, then to the smaller id.
    pub fn top_patterns(&self, category: PatternCategory, limit: usize) -> Vec<&EffectivenessPattern> {
        let mut matches: Vec<&EffectivenessPattern> = self
            .patterns
            .values()
            .filter(|p| p.category == category)
            .collect();
        sort_by_score(&mut matches);
        matches.truncate(limit);
        matches
    }

    /// Patterns carrying every one of `conditions`, best first.
    pub fn patterns_matching(&self, conditions: &[&str]) -> Vec<&EffectivenessPattern> {
        let wanted: Vec<String> = conditions.iter().map(|c| c.trim().to_lowercase()).collect();
        let mut matches: Vec<&EffectivenessPattern> = self
            .patterns
            .values()
            .filter(|p| wanted.iter().all(|w| p.conditions.contains(w)))
            .collect();
        sort_by_score(&mut matches);
        matches
    }

    /// All patterns, ordered by id.
    pub fn snapshot(&self) -> Vec<EffectivenessPattern> {
        self.patterns.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn sort_by_score(patterns: &mut [&EffectivenessPattern]) {
    patterns.sort_by(|a, b| {
        b.effectiveness
            .total_cmp(&a.effectiveness)
            .then(b.usage_frequency.cmp(&a.usage_frequency))
            .then(a.id.cmp(&b.id))
    });
}
