//! Fluent builders for raw source payloads.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Map, Value};

use canon_core::EntityKind;

/// A fixed UTC timestamp.
///
/// # Panics
/// Panics on an impossible date.
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("invalid fixture date {year}-{month}-{day} {hour}h"))
}

/// Builds a payload in the shape a source returns for `kind`.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    kind: EntityKind,
    id: String,
    name: String,
    entity_type: Option<String>,
    description: Option<String>,
    traits: Vec<String>,
    relationships: Vec<(String, String)>,
    updated_at: Option<DateTime<Utc>>,
}

impl PayloadBuilder {
    pub fn new(kind: EntityKind, id: &str, name: &str) -> Self {
        Self {
            kind,
            id: id.to_string(),
            name: name.to_string(),
            entity_type: None,
            description: None,
            traits: Vec::new(),
            relationships: Vec::new(),
            updated_at: None,
        }
    }

    pub fn character(id: &str, name: &str) -> Self {
        Self::new(EntityKind::Character, id, name)
    }

    pub fn location(id: &str, name: &str) -> Self {
        Self::new(EntityKind::Location, id, name)
    }

    pub fn organization(id: &str, name: &str) -> Self {
        Self::new(EntityKind::Organization, id, name)
    }

    pub fn entity_type(mut self, entity_type: &str) -> Self {
        self.entity_type = Some(entity_type.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Personality, features or values depending on the kind.
    pub fn traits(mut self, traits: &[&str]) -> Self {
        self.traits = traits.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn relationship(mut self, target: &str, relation: &str) -> Self {
        self.relationships
            .push((target.to_string(), relation.to_string()));
        self
    }

    pub fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn build(self) -> Value {
        let (trait_field, relation_field) = match self.kind {
            EntityKind::Character => ("personality", "relationships"),
            EntityKind::Location => ("features", "connections"),
            EntityKind::Organization => ("values", "members"),
        };

        let mut payload = Map::new();
        payload.insert("kind".to_string(), json!(self.kind.as_str()));
        payload.insert("id".to_string(), json!(self.id));
        payload.insert("name".to_string(), json!(self.name));
        if let Some(entity_type) = self.entity_type {
            payload.insert("type".to_string(), json!(entity_type));
        }
        if let Some(description) = self.description {
            payload.insert("description".to_string(), json!(description));
        }
        if !self.traits.is_empty() {
            payload.insert(trait_field.to_string(), json!(self.traits));
        }
        if !self.relationships.is_empty() {
            let relationships: Vec<Value> = self
                .relationships
                .into_iter()
                .map(|(target, relation)| json!({ "target": target, "relation": relation }))
                .collect();
            payload.insert(relation_field.to_string(), Value::Array(relationships));
        }
        if let Some(updated_at) = self.updated_at {
            payload.insert("updated_at".to_string(), json!(updated_at));
        }
        Value::Object(payload)
    }
}
