use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::ID_HASH_LEN;

/// What kind of behaviour a pattern captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    /// A prompt that produced good output.
    Prompt,
    /// A strategy that worked (or didn't).
    Strategy,
    /// A problem paired with the solution applied to it.
    ProblemSolution,
    /// Outcome of a consolidation pass for a subject key.
    Consolidation,
}

impl PatternCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Strategy => "strategy",
            Self::ProblemSolution => "problem_solution",
            Self::Consolidation => "consolidation",
        }
    }
}

/// A scored, reusable record of an observed behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessPattern {
    /// Content hash of category + normalized description.
    pub id: String,
    pub category: PatternCategory,
    pub description: String,
    pub conditions: Vec<String>,
    /// Running average in `0.0..=1.0`.
    pub effectiveness: f64,
    pub usage_frequency: u64,
    pub success_cases: Vec<String>,
    pub failure_cases: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

/// Stable id for a pattern: whitespace-collapsed, lowercased text hashed
/// together with its category.
pub fn pattern_id(category: PatternCategory, text: &str) -> String {
    let normalized = normalize_pattern_text(text);
    let mut hasher = blake3::Hasher::new();
    hasher.update(category.as_str().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize().to_hex();
    format!("pat_{}", &digest[..ID_HASH_LEN])
}

pub fn normalize_pattern_text(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_ignores_case_and_spacing() {
        assert_eq!(
            pattern_id(PatternCategory::Prompt, "Describe the  harbor"),
            pattern_id(PatternCategory::Prompt, "describe the harbor "),
        );
    }

    #[test]
    fn id_depends_on_category() {
        assert_ne!(
            pattern_id(PatternCategory::Prompt, "x"),
            pattern_id(PatternCategory::Strategy, "x"),
        );
    }
}
