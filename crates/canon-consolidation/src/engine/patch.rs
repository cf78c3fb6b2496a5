//! Manual edits through `update`.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use canon_core::candidate::{normalize_list, normalize_relationships};
use canon_core::config::SourceWeights;
use canon_core::constants::{MANUAL_RESOLVER, MANUAL_SOURCE_ID};
use canon_core::errors::{CanonResult, RecordError};
use canon_core::record::{normalize_identity, version, RecordPatch};
use canon_core::{ConflictResolution, ConsolidationSource, MasterRecord, ResolutionMethod, SourceKind};

/// Apply `patch` to a copy of `record`.
///
/// Returns `Ok(None)` when every patched value equals the current one. Each
/// changed field appends one manual conflict entry, the manual contributor
/// is refreshed, and the patch version is bumped.
pub fn apply_patch(
    record: &MasterRecord,
    patch: &RecordPatch,
    manual: SourceWeights,
    now: DateTime<Utc>,
) -> CanonResult<Option<MasterRecord>> {
    if patch.is_empty() {
        return Err(RecordError::InvalidPatch {
            reason: "patch changes nothing".to_string(),
        }
        .into());
    }

    let mut next = record.clone();
    let mut changes: Vec<(&str, Value, Value)> = Vec::new();

    if let Some(name) = &patch.name {
        let name = name.trim();
        if normalize_identity(name) != record.identity_key {
            return Err(RecordError::InvalidPatch {
                reason: format!("name {name:?} would change the record identity"),
            }
            .into());
        }
        if name != record.name {
            changes.push(("name", json!(record.name), json!(name)));
            next.name = name.to_string();
        }
    }

    if let Some(entity_type) = &patch.entity_type {
        let entity_type = entity_type.trim();
        if entity_type != record.entity_type {
            changes.push(("entity_type", json!(record.entity_type), json!(entity_type)));
            next.entity_type = entity_type.to_string();
        }
    }

    if let Some(description) = &patch.description {
        let description = description.trim();
        if description != record.description {
            changes.push(("description", json!(record.description), json!(description)));
            next.description = description.to_string();
        }
    }

    if let Some(traits) = &patch.traits {
        let traits = normalize_list(traits.clone());
        if traits != record.traits {
            changes.push(("traits", json!(record.traits), json!(traits)));
            next.traits = traits;
        }
    }

    if let Some(relationships) = &patch.relationships {
        let relationships = normalize_relationships(relationships.clone());
        if relationships != record.relationships {
            changes.push((
                "relationships",
                json!(record.relationships),
                json!(relationships),
            ));
            next.relationships = relationships;
        }
    }

    if let Some(extensions) = &patch.extensions {
        if extensions != &record.extensions {
            changes.push((
                "extensions",
                serde_json::to_value(&record.extensions)?,
                serde_json::to_value(extensions)?,
            ));
            next.extensions = extensions.clone();
        }
    }

    if changes.is_empty() {
        return Ok(None);
    }

    let overruled = record
        .consolidated_from
        .iter()
        .find(|s| s.source != SourceKind::Manual)
        .map(|s| s.source)
        .unwrap_or(SourceKind::Manual);

    for (field, old, new) in changes {
        next.conflict_resolutions.push(ConflictResolution {
            conflict_type: field.to_string(),
            source_a: SourceKind::Manual,
            source_b: overruled,
            conflict_data: json!({ "a": new, "b": old }),
            resolution: new,
            resolution_method: ResolutionMethod::Manual,
            resolved_at: now,
            resolved_by: MANUAL_RESOLVER.to_string(),
        });
    }

    next.consolidated_from.retain(|s| s.source != SourceKind::Manual);
    next.consolidated_from.push(ConsolidationSource {
        source: SourceKind::Manual,
        source_id: MANUAL_SOURCE_ID.to_string(),
        last_updated: now,
        priority: manual.priority,
        reliability: manual.reliability,
    });
    next.consolidated_from.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.source.cmp(&b.source))
            .then(a.source_id.cmp(&b.source_id))
    });

    next.master_version = version::bump_patch(&record.master_version)?;
    Ok(Some(next))
}
