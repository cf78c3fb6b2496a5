//! Index builder: name, type and relationship lookups, rebuilt in full from
//! the record set on every change.

use std::collections::BTreeMap;

use serde::Serialize;

use canon_core::record::normalize_identity;
use canon_core::MasterRecord;

/// A resolved relationship edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RelatedEdge {
    pub target_id: String,
    pub relation: String,
}

/// Lookup tables over the current records. Records reference each other by
/// name; edges here are resolved to ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordIndex {
    /// Record id → identity key.
    pub by_id: BTreeMap<String, String>,
    /// Normalized name → record id.
    pub by_name: BTreeMap<String, String>,
    /// Lowercased entity type → sorted record ids.
    pub by_type: BTreeMap<String, Vec<String>>,
    /// Record id → sorted, deduplicated outgoing edges.
    pub relationships: BTreeMap<String, Vec<RelatedEdge>>,
    /// Declared relationships whose target matches no record.
    pub unresolved: usize,
}

impl RecordIndex {
    /// Build from scratch. Linear in records plus relationships.
    pub fn build<'a>(records: impl IntoIterator<Item = &'a MasterRecord>) -> Self {
        let records: Vec<&MasterRecord> = records.into_iter().collect();
        let mut index = Self::default();

        for record in &records {
            index
                .by_id
                .insert(record.id.clone(), record.identity_key.clone());
            index
                .by_name
                .insert(normalize_identity(&record.name), record.id.clone());
            let entity_type = record.entity_type.trim().to_lowercase();
            if !entity_type.is_empty() {
                index
                    .by_type
                    .entry(entity_type)
                    .or_default()
                    .push(record.id.clone());
            }
        }
        for ids in index.by_type.values_mut() {
            ids.sort();
            ids.dedup();
        }

        for record in &records {
            let mut edges = Vec::with_capacity(record.relationships.len());
            for declared in &record.relationships {
                match index.by_name.get(&normalize_identity(&declared.target)) {
                    Some(target_id) => edges.push(RelatedEdge {
                        target_id: target_id.clone(),
                        relation: declared.relation.clone(),
                    }),
                    None => index.unresolved += 1,
                }
            }
            edges.sort();
            edges.dedup();
            if !edges.is_empty() {
                index.relationships.insert(record.id.clone(), edges);
            }
        }
        index
    }

    pub fn id_for_name(&self, name: &str) -> Option<&str> {
        self.by_name.get(&normalize_identity(name)).map(String::as_str)
    }

    pub fn ids_for_type(&self, entity_type: &str) -> &[String] {
        self.by_type
            .get(&entity_type.trim().to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn edges(&self, id: &str) -> &[RelatedEdge] {
        self.relationships
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.relationships.values().map(Vec::len).sum()
    }
}
