//! Validated schema for raw source payloads.
//!
//! Sources hand back untyped JSON. Loaders run every payload through
//! [`SourceRecord::parse`]: known shapes become a [`Candidate`], everything
//! else becomes a [`Rejection`] and never reaches the merger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SourceError;
use crate::record::{normalize_identity, DeclaredRelationship, EntityKind, SourceKind};

/// Known payload shapes, discriminated by the `kind` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceRecord {
    Character(CharacterRecord),
    Location(LocationRecord),
    Organization(OrganizationRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub personality: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<DeclaredRelationship>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub connections: Vec<DeclaredRelationship>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRecord {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub structure: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub members: Vec<DeclaredRelationship>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A payload that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub source: SourceKind,
    /// Raw id when one could be read, otherwise `"<unknown>"`.
    pub source_id: String,
    pub reason: String,
}

/// A validated candidate, ready for merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub source: SourceKind,
    pub source_id: String,
    pub identity_key: String,
    pub name: String,
    pub kind: EntityKind,
    pub entity_type: String,
    pub description: String,
    /// Sorted, deduplicated.
    pub traits: Vec<String>,
    /// Sorted, deduplicated.
    pub relationships: Vec<DeclaredRelationship>,
    pub last_updated: DateTime<Utc>,
}

impl SourceRecord {
    /// Deserialize and validate a raw payload.
    pub fn parse(value: serde_json::Value) -> Result<Self, SourceError> {
        let source_id = raw_id(&value);
        let record: SourceRecord =
            serde_json::from_value(value).map_err(|e| SourceError::InvalidPayload {
                source_id: source_id.clone(),
                reason: e.to_string(),
            })?;
        record.validate()?;
        Ok(record)
    }

    fn validate(&self) -> Result<(), SourceError> {
        let (id, name) = (self.id(), self.name());
        if id.trim().is_empty() {
            return Err(SourceError::InvalidPayload {
                source_id: "<unknown>".to_string(),
                reason: "empty id".to_string(),
            });
        }
        if normalize_identity(name).is_empty() {
            return Err(SourceError::InvalidPayload {
                source_id: id.to_string(),
                reason: format!("name {name:?} has no identifying characters"),
            });
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Character(r) => &r.id,
            Self::Location(r) => &r.id,
            Self::Organization(r) => &r.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Character(r) => &r.name,
            Self::Location(r) => &r.name,
            Self::Organization(r) => &r.name,
        }
    }

    /// Flatten into the common candidate shape.
    ///
    /// `fallback_time` stamps payloads that carry no `updated_at`.
    pub fn into_candidate(self, source: SourceKind, fallback_time: DateTime<Utc>) -> Candidate {
        let (kind, id, name, entity_type, description, traits, relationships, updated_at) =
            match self {
                Self::Character(r) => (
                    EntityKind::Character,
                    r.id,
                    r.name,
                    r.role,
                    r.description,
                    r.personality,
                    r.relationships,
                    r.updated_at,
                ),
                Self::Location(r) => (
                    EntityKind::Location,
                    r.id,
                    r.name,
                    r.category,
                    r.description,
                    r.features,
                    r.connections,
                    r.updated_at,
                ),
                Self::Organization(r) => (
                    EntityKind::Organization,
                    r.id,
                    r.name,
                    r.structure,
                    r.description,
                    r.values,
                    r.members,
                    r.updated_at,
                ),
            };

        Candidate {
            source,
            source_id: id.trim().to_string(),
            identity_key: normalize_identity(&name),
            name: name.trim().to_string(),
            kind,
            entity_type: entity_type.trim().to_string(),
            description: description.trim().to_string(),
            traits: normalize_list(traits),
            relationships: normalize_relationships(relationships),
            last_updated: updated_at.unwrap_or(fallback_time),
        }
    }
}

fn raw_id(value: &serde_json::Value) -> String {
    match value.get("id") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) if !other.is_null() => other.to_string(),
        _ => "<unknown>".to_string(),
    }
}

/// Trim, lowercase, drop empties, sort, dedup.
pub fn normalize_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = items
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Trim targets, lowercase relations, drop unnamed targets, sort, dedup.
pub fn normalize_relationships(items: Vec<DeclaredRelationship>) -> Vec<DeclaredRelationship> {
    let mut out: Vec<DeclaredRelationship> = items
        .into_iter()
        .map(|r| DeclaredRelationship {
            target: r.target.trim().to_string(),
            relation: r.relation.trim().to_lowercase(),
        })
        .filter(|r| !normalize_identity(&r.target).is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_character_payload() {
        let value = json!({
            "kind": "character",
            "id": "c-1",
            "name": "  Mira Vale ",
            "type": "protagonist",
            "description": "A cartographer.",
            "personality": ["Curious", "curious", " stubborn "],
            "relationships": [{"target": "Old Tomas", "relation": "Mentor"}],
        });
        let now = Utc::now();
        let candidate = SourceRecord::parse(value)
            .unwrap()
            .into_candidate(SourceKind::Primary, now);

        assert_eq!(candidate.identity_key, "miravale");
        assert_eq!(candidate.name, "Mira Vale");
        assert_eq!(candidate.kind, EntityKind::Character);
        assert_eq!(candidate.entity_type, "protagonist");
        assert_eq!(candidate.traits, vec!["curious", "stubborn"]);
        assert_eq!(candidate.relationships[0].relation, "mentor");
        assert_eq!(candidate.last_updated, now);
    }

    #[test]
    fn missing_relation_defaults_to_related() {
        let value = json!({
            "kind": "location",
            "id": "l-1",
            "name": "Harbor",
            "connections": [{"target": "Lighthouse"}],
        });
        let candidate = SourceRecord::parse(value)
            .unwrap()
            .into_candidate(SourceKind::Secondary, Utc::now());
        assert_eq!(candidate.relationships[0].relation, "related");
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = SourceRecord::parse(json!({"kind": "spaceship", "id": "x", "name": "Y"}));
        match err {
            Err(SourceError::InvalidPayload { source_id, .. }) => assert_eq!(source_id, "x"),
            other => panic!("expected InvalidPayload, got {other:?}"),
        }
    }

    #[test]
    fn rejects_blank_name_and_id() {
        assert!(SourceRecord::parse(json!({"kind": "character", "id": "a", "name": " - "})).is_err());
        assert!(SourceRecord::parse(json!({"kind": "character", "id": " ", "name": "Bo"})).is_err());
        assert!(SourceRecord::parse(json!({"kind": "character", "name": "Bo"})).is_err());
    }
}
