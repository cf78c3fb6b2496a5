use std::collections::BTreeMap;

use chrono::Utc;
use proptest::prelude::*;

use canon_core::config::LearningConfig;
use canon_core::effectiveness::{PatternCategory, Priority, TrendDirection};
use canon_learning::{
    classify_trend, EffectivenessTracker, PassOutcome, ProblemSolution, ScoredText, UnitOfWork,
};

fn unit(id: &str) -> UnitOfWork {
    let mut subsystem_scores = BTreeMap::new();
    subsystem_scores.insert("dialogue".to_string(), vec![0.9, 0.85]);
    subsystem_scores.insert("pacing".to_string(), vec![0.1, 0.2]);
    subsystem_scores.insert("setting".to_string(), vec![0.4]);
    subsystem_scores.insert("empty".to_string(), vec![]);
    UnitOfWork {
        unit_id: id.to_string(),
        label: "chapter one".to_string(),
        sub_unit_scores: vec![2.0, 2.0, 2.0, 8.0, 8.0, 8.0],
        subsystem_scores,
        effective_prompts: vec![ScoredText {
            text: "Open on the harbor at dawn".to_string(),
            effectiveness: 0.8,
        }],
        strategies: vec![ScoredText {
            text: "outline before drafting".to_string(),
            effectiveness: 0.9,
        }],
        problem_solutions: vec![ProblemSolution {
            problem: "flat villain".to_string(),
            solution: "give a personal stake".to_string(),
            effectiveness: 0.7,
        }],
        conditions: vec!["Mystery".to_string()],
    }
}

#[test]
fn complete_unit_builds_a_record() {
    let mut tracker = EffectivenessTracker::new(LearningConfig::default());
    let record = tracker.complete_unit(unit("u1"), Utc::now());

    assert_eq!(record.unit_id, "u1");
    assert_eq!(record.quality_trend.direction, TrendDirection::Improving);
    assert!(record.quality_trend.strength > 0.5);
    assert_eq!(record.subsystem_scores.len(), 3);
    assert!(!record.subsystem_scores.contains_key("empty"));
    assert!((record.subsystem_scores["pacing"] - 0.15).abs() < 1e-9);

    let priorities: Vec<Priority> = record.recommendations.iter().map(|r| r.priority).collect();
    let mut sorted = priorities.clone();
    sorted.sort();
    assert_eq!(priorities, sorted);
    assert_eq!(record.recommendations[0].subsystem, "pacing");
    assert!(record
        .recommendations
        .iter()
        .any(|r| r.subsystem == "setting" && r.priority == Priority::Medium));
    assert!(record.lessons.iter().any(|l| l.contains("dialogue")));

    assert_eq!(tracker.records().len(), 1);
    assert_eq!(tracker.patterns().len(), 3);
}

#[test]
fn repeated_prompt_is_averaged() {
    let mut tracker = EffectivenessTracker::new(LearningConfig::default());
    tracker.complete_unit(unit("u1"), Utc::now());
    let mut second = unit("u2");
    second.effective_prompts[0].effectiveness = 0.6;
    tracker.complete_unit(second, Utc::now());

    let prompt = tracker
        .patterns()
        .find(PatternCategory::Prompt, "open on the harbor at dawn")
        .unwrap();
    assert_eq!(prompt.usage_frequency, 2);
    assert!((prompt.effectiveness - 0.7).abs() < 1e-9);
    assert_eq!(prompt.conditions, vec!["mystery"]);

    let top = tracker.top_patterns(PatternCategory::Strategy, 5);
    assert_eq!(top.len(), 1);
    assert_eq!(tracker.patterns_matching(&["mystery"]).len(), 3);
    assert!(tracker.patterns_matching(&["romance"]).is_empty());
}

#[test]
fn pass_outcomes_feed_consolidation_patterns() {
    let mut tracker = EffectivenessTracker::default();
    let mut outcome = PassOutcome {
        subject: "harbor".to_string(),
        operation_id: "op-1".to_string(),
        records: 4,
        conflicts: 1,
        rejections: 0,
        sources_available: 2,
        sources_total: 2,
        persisted: true,
    };
    let first = tracker.record_pass_outcome(&outcome, Utc::now()).clone();
    assert_eq!(first.effectiveness, 1.0);
    assert_eq!(first.success_cases, vec!["op-1"]);

    outcome.operation_id = "op-2".to_string();
    outcome.sources_available = 1;
    outcome.persisted = false;
    let second = tracker.record_pass_outcome(&outcome, Utc::now());
    assert_eq!(second.usage_frequency, 2);
    assert!((second.effectiveness - 0.625).abs() < 1e-9);
    assert_eq!(second.failure_cases, vec!["op-2"]);
    assert!(second.conditions.contains(&"degraded-sources".to_string()));

    let hits = tracker.patterns_matching(&["subject:harbor"]);
    assert_eq!(hits.len(), 1);

    outcome.operation_id = "op-3".to_string();
    outcome.sources_available = 2;
    outcome.persisted = true;
    let recovered = tracker.record_pass_outcome(&outcome, Utc::now());
    assert!(!recovered.conditions.contains(&"degraded-sources".to_string()));
    assert!(tracker.patterns_matching(&["degraded-sources"]).is_empty());
    assert_eq!(tracker.patterns_matching(&["subject:harbor"]).len(), 1);
}

proptest! {
    #[test]
    fn trend_strength_is_always_in_unit_range(
        series in proptest::collection::vec(0.0f64..10.0, 0..40),
    ) {
        let trend = classify_trend(&series, 0.5, 10.0);
        prop_assert!((0.0..=1.0).contains(&trend.strength));
        prop_assert_eq!(trend.samples, series.len());
    }

    #[test]
    fn running_average_stays_within_observed_bounds(
        scores in proptest::collection::vec(0.0f64..=1.0, 1..20),
    ) {
        let mut tracker = EffectivenessTracker::default();
        let mut last = None;
        for (i, s) in scores.iter().enumerate() {
            let mut u = UnitOfWork { unit_id: format!("u{i}"), ..Default::default() };
            u.strategies.push(ScoredText { text: "same".into(), effectiveness: *s });
            tracker.complete_unit(u, Utc::now());
            last = tracker.patterns().find(PatternCategory::Strategy, "same").cloned();
        }
        let pattern = last.unwrap();
        let lo = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(pattern.effectiveness >= lo - 1e-12 && pattern.effectiveness <= hi + 1e-12);
        prop_assert_eq!(pattern.usage_frequency, scores.len() as u64);
    }
}
