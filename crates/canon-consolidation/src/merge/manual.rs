//! Manual edits carried across consolidation passes.
//!
//! A field set through `update` stays pinned: later passes still merge the
//! sources, but the manual value wins and any divergence is logged.

use std::collections::BTreeSet;

use serde_json::Value;

use canon_core::errors::CanonResult;
use canon_core::record::RecordExtensions;
use canon_core::{ConflictResolution, ConsolidationSource, MasterRecord, ResolutionMethod, SourceKind};

pub(crate) const EXTENSIONS_FIELD: &str = "extensions";

/// The manual contributor entry, if the record was ever edited.
pub(crate) fn manual_source(record: &MasterRecord) -> Option<&ConsolidationSource> {
    record
        .consolidated_from
        .iter()
        .find(|s| s.source == SourceKind::Manual)
}

/// Fields with at least one manual entry in the conflict log.
pub(crate) fn pinned_fields(record: &MasterRecord) -> BTreeSet<&str> {
    manual_edits(record)
        .map(|c| c.conflict_type.as_str())
        .collect()
}

fn manual_edits(record: &MasterRecord) -> impl Iterator<Item = &ConflictResolution> {
    record
        .conflict_resolutions
        .iter()
        .filter(|c| c.resolution_method == ResolutionMethod::Manual)
}

/// Reapply manually edited extension values over `enriched`.
///
/// Only the leaves a patch actually changed are carried, in log order.
/// Returns `Ok(None)` when the extensions were never edited.
pub(crate) fn overlay_extensions(
    record: &MasterRecord,
    enriched: &RecordExtensions,
) -> CanonResult<Option<RecordExtensions>> {
    let mut edits = manual_edits(record)
        .filter(|c| c.conflict_type == EXTENSIONS_FIELD)
        .peekable();
    if edits.peek().is_none() {
        return Ok(None);
    }

    let mut value = serde_json::to_value(enriched)?;
    for edit in edits {
        let (Some(new), Some(old)) = (edit.conflict_data.get("a"), edit.conflict_data.get("b"))
        else {
            continue;
        };
        overlay(&mut value, new, old);
    }
    Ok(Some(serde_json::from_value(value)?))
}

fn overlay(target: &mut Value, new: &Value, old: &Value) {
    match (target, new) {
        (Value::Object(target), Value::Object(new)) => {
            for (key, new_value) in new {
                let old_value = old.get(key).unwrap_or(&Value::Null);
                if new_value == old_value {
                    continue;
                }
                match target.get_mut(key) {
                    Some(slot) if new_value.is_object() && old_value.is_object() => {
                        overlay(slot, new_value, old_value)
                    }
                    Some(slot) => *slot = new_value.clone(),
                    None => {
                        target.insert(key.clone(), new_value.clone());
                    }
                }
            }
        }
        (target, new) => *target = new.clone(),
    }
}
