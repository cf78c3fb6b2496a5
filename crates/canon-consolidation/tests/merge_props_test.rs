use std::collections::BTreeMap;
use std::sync::Arc;

use proptest::prelude::*;

use canon_core::config::SourceConfig;
use canon_core::SourceKind;
use canon_consolidation::{
    ConflictResolver, HeuristicEnricher, LoadedSource, Merger, RecordIndex,
};
use test_fixtures::{at, PayloadBuilder};

const NAMES: &[&str] = &["Mira Vale", "mira  vale", "Corin Ash", "Gloomwood", "Old Tower"];
const TYPES: &[&str] = &["", "mentor", "villain", "harbor", "ruin"];

#[derive(Debug, Clone)]
struct Spec {
    secondary: bool,
    name: usize,
    entity_type: usize,
    description: String,
    traits: Vec<String>,
    target: Option<usize>,
    day: u32,
}

fn spec() -> impl Strategy<Value = Spec> {
    (
        any::<bool>(),
        0..NAMES.len(),
        0..TYPES.len(),
        "[a-z ]{0,24}",
        prop::collection::vec("[a-z]{3,6}", 0..3),
        prop::option::of(0..NAMES.len()),
        1u32..28,
    )
        .prop_map(
            |(secondary, name, entity_type, description, traits, target, day)| Spec {
                secondary,
                name,
                entity_type,
                description,
                traits,
                target,
                day,
            },
        )
}

fn load(specs: &[Spec]) -> (LoadedSource, LoadedSource) {
    let mut primary = Vec::new();
    let mut secondary = Vec::new();
    for (i, s) in specs.iter().enumerate() {
        let traits: Vec<&str> = s.traits.iter().map(String::as_str).collect();
        let mut payload = PayloadBuilder::character(&format!("id-{i}"), NAMES[s.name])
            .entity_type(TYPES[s.entity_type])
            .description(&s.description)
            .traits(&traits)
            .updated_at(at(2026, 2, s.day, 12));
        if let Some(target) = s.target {
            payload = payload.relationship(NAMES[target], "knows");
        }
        if s.secondary {
            secondary.push(payload.build());
        } else {
            primary.push(payload.build());
        }
    }
    let fallback = at(2026, 1, 1, 0);
    (
        LoadedSource::from_payloads(SourceKind::Primary, primary, fallback),
        LoadedSource::from_payloads(SourceKind::Secondary, secondary, fallback),
    )
}

fn merger() -> Merger {
    Merger::new(
        ConflictResolver::new(SourceConfig::default()),
        Arc::new(HeuristicEnricher::default()),
    )
}

proptest! {
    #[test]
    fn merge_ignores_source_order(specs in prop::collection::vec(spec(), 0..12)) {
        let (primary, secondary) = load(&specs);
        let now = at(2026, 3, 1, 9);
        let existing = BTreeMap::new();
        let a = merger().merge(&[primary.clone(), secondary.clone()], &existing, now);
        let b = merger().merge(&[secondary, primary], &existing, now);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn remerging_unchanged_inputs_keeps_versions(specs in prop::collection::vec(spec(), 0..12)) {
        let (primary, secondary) = load(&specs);
        let sources = [primary, secondary];
        let first = merger().merge(&sources, &BTreeMap::new(), at(2026, 3, 1, 9));
        let second = merger().merge(&sources, &first.records, at(2026, 3, 2, 9));

        prop_assert!(second.created.is_empty());
        prop_assert!(second.updated.is_empty());
        prop_assert_eq!(second.conflicts_logged, 0);
        prop_assert_eq!(second.records.len(), first.records.len());
        for (key, record) in &first.records {
            let again = &second.records[key];
            prop_assert_eq!(&again.master_version, &record.master_version);
            prop_assert!(again.content_eq(record));
        }
    }

    #[test]
    fn one_record_per_identity(specs in prop::collection::vec(spec(), 0..12)) {
        let (primary, secondary) = load(&specs);
        let report = merger().merge(&[primary, secondary], &BTreeMap::new(), at(2026, 3, 1, 9));
        let mut ids: Vec<&str> = report.records.values().map(|r| r.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), report.records.len());
        for (key, record) in &report.records {
            prop_assert_eq!(key, &record.identity_key);
        }
    }

    #[test]
    fn index_rebuild_is_idempotent(specs in prop::collection::vec(spec(), 0..12)) {
        let (primary, secondary) = load(&specs);
        let report = merger().merge(&[primary, secondary], &BTreeMap::new(), at(2026, 3, 1, 9));
        let once = RecordIndex::build(report.records.values());
        let twice = RecordIndex::build(report.records.values().rev());
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.by_id.len(), report.records.len());

        let declared: usize = report.records.values().map(|r| r.relationships.len()).sum();
        prop_assert!(once.edge_count() + once.unresolved <= declared);
        for edges in once.relationships.values() {
            for edge in edges {
                prop_assert!(once.by_id.contains_key(&edge.target_id));
            }
        }
    }
}
