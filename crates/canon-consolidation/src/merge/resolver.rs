//! Field-level conflict resolution for one identity key.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use canon_core::config::SourceConfig;
use canon_core::constants::{INITIAL_MASTER_VERSION, SYSTEM_RESOLVER};
use canon_core::errors::CanonResult;
use canon_core::record::{master_id_for, version, DeclaredRelationship, RecordExtensions};
use canon_core::{
    Candidate, ConflictResolution, ConsolidationSource, MasterRecord, ResolutionMethod,
    SourceKind,
};

use super::manual;

/// How a resolved record relates to what was there before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordChange {
    Created,
    Updated,
    Unchanged,
}

/// Output of [`ConflictResolver::resolve`], before enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub record: MasterRecord,
    pub change: RecordChange,
    /// Conflict entries appended to the log by this resolution.
    pub new_conflicts: usize,
}

/// Merges the contributors of one identity key into a master record.
///
/// Pure: the result depends only on the contributors, the existing record
/// and `now`.
#[derive(Debug, Clone)]
pub struct ConflictResolver {
    sources: SourceConfig,
}

impl ConflictResolver {
    pub fn new(sources: SourceConfig) -> Self {
        Self { sources }
    }

    /// Descending priority, ties by source enumeration order, then source id.
    pub fn order<'a>(&self, mut contributors: Vec<&'a Candidate>) -> Vec<&'a Candidate> {
        contributors.sort_by(|a, b| {
            let pa = self.sources.weights(a.source).priority;
            let pb = self.sources.weights(b.source).priority;
            pb.cmp(&pa)
                .then(a.source.cmp(&b.source))
                .then(a.source_id.cmp(&b.source_id))
        });
        contributors
    }

    /// Resolve one identity key.
    ///
    /// A divergence is logged once: entries already in the log (ignoring
    /// timestamps) are not appended again, so a disagreement that persists
    /// across passes leaves the version alone. An empty value filled from a
    /// lower-priority source is not a conflict.
    ///
    /// Fields edited through `update` stay pinned to their manual value; a
    /// source that disagrees with one is logged as a `priority` conflict.
    pub fn resolve(
        &self,
        identity_key: &str,
        contributors: &[&Candidate],
        existing: Option<&MasterRecord>,
        now: DateTime<Utc>,
    ) -> CanonResult<Option<Resolved>> {
        let ordered = self.order(contributors.to_vec());
        let Some(primary) = ordered.first().copied() else {
            return Ok(None);
        };

        let mut fields = MergedFields::seed(primary);
        let mut conflicts = Vec::new();
        for other in ordered.iter().skip(1) {
            fields.absorb(primary, other, now, &mut conflicts);
        }

        let mut consolidated_from: Vec<ConsolidationSource> = ordered
            .iter()
            .map(|c| {
                let weights = self.sources.weights(c.source);
                ConsolidationSource {
                    source: c.source,
                    source_id: c.source_id.clone(),
                    last_updated: c.last_updated,
                    priority: weights.priority,
                    reliability: weights.reliability,
                }
            })
            .collect();

        if let Some(edited) = existing {
            if let Some(entry) = manual::manual_source(edited) {
                fields.pin_manual(edited, primary.source, now, &mut conflicts);
                let weights = self.sources.weights(SourceKind::Manual);
                consolidated_from.push(ConsolidationSource {
                    priority: weights.priority,
                    reliability: weights.reliability,
                    ..entry.clone()
                });
                consolidated_from.sort_by(|a, b| {
                    b.priority
                        .cmp(&a.priority)
                        .then(a.source.cmp(&b.source))
                        .then(a.source_id.cmp(&b.source_id))
                });
            }
        }

        let mut conflict_resolutions = existing
            .map(|e| e.conflict_resolutions.clone())
            .unwrap_or_default();
        let mut new_conflicts = 0;
        for conflict in conflicts {
            if !conflict_resolutions.iter().any(|c| same_conflict(c, &conflict)) {
                conflict_resolutions.push(conflict);
                new_conflicts += 1;
            }
        }

        let mut record = MasterRecord {
            id: existing
                .map(|e| e.id.clone())
                .unwrap_or_else(|| master_id_for(identity_key)),
            identity_key: identity_key.to_string(),
            name: fields.name,
            kind: fields.kind,
            entity_type: fields.entity_type,
            description: fields.description,
            traits: fields.traits,
            relationships: fields.relationships,
            master_version: existing
                .map(|e| e.master_version.clone())
                .unwrap_or_else(|| INITIAL_MASTER_VERSION.to_string()),
            consolidated_from,
            conflict_resolutions,
            extensions: existing
                .map(|e| e.extensions.clone())
                .unwrap_or_else(|| RecordExtensions::minimal(fields.kind)),
            created_at: existing.map(|e| e.created_at).unwrap_or(now),
            last_consolidated: now,
        };

        let change = match existing {
            None => RecordChange::Created,
            Some(e) if new_conflicts > 0 || !e.content_eq(&record) => {
                record.master_version = version::bump_patch(&e.master_version)?;
                RecordChange::Updated
            }
            Some(_) => RecordChange::Unchanged,
        };

        Ok(Some(Resolved {
            record,
            change,
            new_conflicts,
        }))
    }
}

struct MergedFields {
    name: String,
    kind: canon_core::EntityKind,
    entity_type: String,
    description: String,
    traits: Vec<String>,
    relationships: Vec<DeclaredRelationship>,
}

impl MergedFields {
    fn seed(primary: &Candidate) -> Self {
        Self {
            name: primary.name.clone(),
            kind: primary.kind,
            entity_type: primary.entity_type.clone(),
            description: primary.description.clone(),
            traits: primary.traits.clone(),
            relationships: primary.relationships.clone(),
        }
    }

    /// Fold one lower-priority contributor in. Empty values fill gaps
    /// silently; two non-empty values that differ log one conflict.
    fn absorb(
        &mut self,
        primary: &Candidate,
        other: &Candidate,
        now: DateTime<Utc>,
        conflicts: &mut Vec<ConflictResolution>,
    ) {
        let log = |conflicts: &mut Vec<ConflictResolution>,
                   field: &str,
                   a: Value,
                   b: Value,
                   resolution: Value,
                   method: ResolutionMethod| {
            conflicts.push(ConflictResolution {
                conflict_type: field.to_string(),
                source_a: primary.source,
                source_b: other.source,
                conflict_data: json!({ "a": a, "b": b }),
                resolution,
                resolution_method: method,
                resolved_at: now,
                resolved_by: SYSTEM_RESOLVER.to_string(),
            });
        };

        if other.name != primary.name {
            log(
                conflicts,
                "name",
                json!(primary.name),
                json!(other.name),
                json!(self.name),
                ResolutionMethod::Priority,
            );
        }

        if other.kind != primary.kind {
            log(
                conflicts,
                "kind",
                json!(primary.kind),
                json!(other.kind),
                json!(self.kind),
                ResolutionMethod::Priority,
            );
        }

        if !other.entity_type.is_empty() && other.entity_type != self.entity_type {
            if self.entity_type.is_empty() {
                self.entity_type = other.entity_type.clone();
            } else {
                log(
                    conflicts,
                    "entity_type",
                    json!(self.entity_type),
                    json!(other.entity_type),
                    json!(self.entity_type),
                    ResolutionMethod::Priority,
                );
            }
        }

        if !other.description.is_empty() && other.description != primary.description {
            let longer = other.description.chars().count() > self.description.chars().count();
            if longer {
                self.description = other.description.clone();
            }
            if !primary.description.is_empty() {
                log(
                    conflicts,
                    "description",
                    json!(primary.description),
                    json!(other.description),
                    json!(self.description),
                    ResolutionMethod::Auto,
                );
            }
        }

        if !other.traits.is_empty() && other.traits != primary.traits {
            self.traits = sorted_union(&self.traits, &other.traits);
            if !primary.traits.is_empty() {
                log(
                    conflicts,
                    "traits",
                    json!(primary.traits),
                    json!(other.traits),
                    json!(self.traits),
                    ResolutionMethod::Merge,
                );
            }
        }

        if !other.relationships.is_empty() && other.relationships != primary.relationships {
            self.relationships = sorted_union(&self.relationships, &other.relationships);
            if !primary.relationships.is_empty() {
                log(
                    conflicts,
                    "relationships",
                    json!(primary.relationships),
                    json!(other.relationships),
                    json!(self.relationships),
                    ResolutionMethod::Merge,
                );
            }
        }
    }

    /// Restore every manually edited field of `edited` over the source merge.
    fn pin_manual(
        &mut self,
        edited: &MasterRecord,
        overruled: SourceKind,
        now: DateTime<Utc>,
        conflicts: &mut Vec<ConflictResolution>,
    ) {
        let pinned = manual::pinned_fields(edited);
        let mut keep = |field: &str, manual: Value, merged: Value| {
            if merged == manual || is_blank(&merged) {
                return;
            }
            conflicts.push(ConflictResolution {
                conflict_type: field.to_string(),
                source_a: SourceKind::Manual,
                source_b: overruled,
                conflict_data: json!({ "a": manual, "b": merged }),
                resolution: manual,
                resolution_method: ResolutionMethod::Priority,
                resolved_at: now,
                resolved_by: SYSTEM_RESOLVER.to_string(),
            });
        };

        if pinned.contains("name") {
            keep("name", json!(edited.name), json!(self.name));
            self.name = edited.name.clone();
        }
        if pinned.contains("entity_type") {
            keep("entity_type", json!(edited.entity_type), json!(self.entity_type));
            self.entity_type = edited.entity_type.clone();
        }
        if pinned.contains("description") {
            keep("description", json!(edited.description), json!(self.description));
            self.description = edited.description.clone();
        }
        if pinned.contains("traits") {
            keep("traits", json!(edited.traits), json!(self.traits));
            self.traits = edited.traits.clone();
        }
        if pinned.contains("relationships") {
            keep(
                "relationships",
                json!(edited.relationships),
                json!(self.relationships),
            );
            self.relationships = edited.relationships.clone();
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Null => true,
        _ => false,
    }
}

fn sorted_union<T: Ord + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut out: Vec<T> = a.iter().chain(b.iter()).cloned().collect();
    out.sort();
    out.dedup();
    out
}

fn same_conflict(a: &ConflictResolution, b: &ConflictResolution) -> bool {
    a.conflict_type == b.conflict_type
        && a.source_a == b.source_a
        && a.source_b == b.source_b
        && a.conflict_data == b.conflict_data
        && a.resolution == b.resolution
        && a.resolution_method == b.resolution_method
}

#[cfg(test)]
mod tests {
    use super::*;
    use canon_core::EntityKind;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()
    }

    fn candidate(source: SourceKind, description: &str, entity_type: &str) -> Candidate {
        Candidate {
            source,
            source_id: format!("{}-1", source.as_str()),
            identity_key: "miravale".to_string(),
            name: "Mira Vale".to_string(),
            kind: EntityKind::Character,
            entity_type: entity_type.to_string(),
            description: description.to_string(),
            traits: Vec::new(),
            relationships: Vec::new(),
            last_updated: now(),
        }
    }

    #[test]
    fn longer_description_wins_with_one_auto_conflict() {
        let resolver = ConflictResolver::new(SourceConfig::default());
        let primary = candidate(SourceKind::Primary, "A cartographer.", "npc");
        let secondary = candidate(
            SourceKind::Secondary,
            "A cartographer who maps the drowned coast.",
            "npc",
        );
        let resolved = resolver
            .resolve("miravale", &[&secondary, &primary], None, now())
            .unwrap()
            .unwrap();

        let record = &resolved.record;
        assert_eq!(record.description, secondary.description);
        assert_eq!(record.conflict_resolutions.len(), 1);
        let conflict = &record.conflict_resolutions[0];
        assert_eq!(conflict.conflict_type, "description");
        assert_eq!(conflict.resolution_method, ResolutionMethod::Auto);
        assert_eq!(conflict.source_a, SourceKind::Primary);
        assert_eq!(conflict.conflict_data["b"], json!(secondary.description));
        assert_eq!(record.master_version, "1.0.0");
        assert_eq!(record.consolidated_from[0].source, SourceKind::Primary);
        assert_eq!(resolved.change, RecordChange::Created);
    }

    #[test]
    fn categorical_fields_keep_primary() {
        let resolver = ConflictResolver::new(SourceConfig::default());
        let primary = candidate(SourceKind::Primary, "", "merchant");
        let secondary = candidate(SourceKind::Secondary, "", "smuggler");
        let record = resolver
            .resolve("miravale", &[&primary, &secondary], None, now())
            .unwrap()
            .unwrap()
            .record;
        assert_eq!(record.entity_type, "merchant");
        assert_eq!(record.conflict_resolutions.len(), 1);
        assert_eq!(
            record.conflict_resolutions[0].resolution_method,
            ResolutionMethod::Priority
        );
    }

    #[test]
    fn empty_values_fill_without_conflict() {
        let resolver = ConflictResolver::new(SourceConfig::default());
        let primary = candidate(SourceKind::Primary, "", "");
        let mut secondary = candidate(SourceKind::Secondary, "Harbor pilot.", "pilot");
        secondary.traits = vec!["calm".to_string()];
        let record = resolver
            .resolve("miravale", &[&primary, &secondary], None, now())
            .unwrap()
            .unwrap()
            .record;
        assert_eq!(record.entity_type, "pilot");
        assert_eq!(record.description, "Harbor pilot.");
        assert_eq!(record.traits, vec!["calm"]);
        assert!(record.conflict_resolutions.is_empty());
    }

    #[test]
    fn rerun_is_unchanged_and_change_bumps_patch() {
        let resolver = ConflictResolver::new(SourceConfig::default());
        let primary = candidate(SourceKind::Primary, "Short.", "npc");
        let secondary = candidate(SourceKind::Secondary, "Much longer text.", "npc");
        let first = resolver
            .resolve("miravale", &[&primary, &secondary], None, now())
            .unwrap()
            .unwrap()
            .record;

        let again = resolver
            .resolve("miravale", &[&primary, &secondary], Some(&first), now())
            .unwrap()
            .unwrap();
        assert_eq!(again.change, RecordChange::Unchanged);
        assert_eq!(again.record.master_version, "1.0.0");
        assert_eq!(again.record.conflict_resolutions.len(), 1);

        let mut edited = primary.clone();
        edited.entity_type = "guide".to_string();
        let changed = resolver
            .resolve("miravale", &[&edited, &secondary], Some(&first), now())
            .unwrap()
            .unwrap();
        assert_eq!(changed.change, RecordChange::Updated);
        assert_eq!(changed.record.master_version, "1.0.1");
        assert_eq!(changed.record.created_at, first.created_at);
        assert_eq!(changed.record.id, first.id);
    }

    #[test]
    fn traits_are_unioned() {
        let resolver = ConflictResolver::new(SourceConfig::default());
        let mut primary = candidate(SourceKind::Primary, "", "");
        primary.traits = vec!["brave".to_string(), "loyal".to_string()];
        let mut secondary = candidate(SourceKind::Secondary, "", "");
        secondary.traits = vec!["brave".to_string(), "curious".to_string()];
        let record = resolver
            .resolve("miravale", &[&primary, &secondary], None, now())
            .unwrap()
            .unwrap()
            .record;
        assert_eq!(record.traits, vec!["brave", "curious", "loyal"]);
        assert_eq!(
            record.conflict_resolutions[0].resolution_method,
            ResolutionMethod::Merge
        );
    }

    #[test]
    fn manual_edits_stay_pinned_across_passes() {
        let resolver = ConflictResolver::new(SourceConfig::default());
        let mut primary = candidate(SourceKind::Primary, "A cartographer.", "npc");
        primary.traits = vec!["brave".to_string(), "curious".to_string()];
        let secondary = candidate(
            SourceKind::Secondary,
            "A cartographer who maps the drowned coast.",
            "npc",
        );
        let first = resolver
            .resolve("miravale", &[&primary, &secondary], None, now())
            .unwrap()
            .unwrap()
            .record;

        let patch = canon_core::record::RecordPatch {
            description: Some("Navigator.".to_string()),
            traits: Some(vec!["curious".to_string()]),
            ..Default::default()
        };
        let edited =
            crate::engine::apply_patch(&first, &patch, SourceConfig::default().manual, now())
                .unwrap()
                .unwrap();

        let later = now() + chrono::Duration::hours(1);
        let pass = resolver
            .resolve("miravale", &[&primary, &secondary], Some(&edited), later)
            .unwrap()
            .unwrap();
        assert_eq!(pass.record.description, "Navigator.");
        assert_eq!(pass.record.traits, vec!["curious"]);
        assert_eq!(pass.record.consolidated_from[0].source, SourceKind::Manual);
        assert_eq!(pass.new_conflicts, 2);
        let overridden: Vec<&str> = pass
            .record
            .conflict_resolutions
            .iter()
            .filter(|c| {
                c.source_a == SourceKind::Manual
                    && c.resolution_method == ResolutionMethod::Priority
            })
            .map(|c| c.conflict_type.as_str())
            .collect();
        assert_eq!(overridden, vec!["description", "traits"]);

        let again = resolver
            .resolve("miravale", &[&primary, &secondary], Some(&pass.record), later)
            .unwrap()
            .unwrap();
        assert_eq!(again.change, RecordChange::Unchanged);
        assert_eq!(again.record.master_version, pass.record.master_version);
    }
}
