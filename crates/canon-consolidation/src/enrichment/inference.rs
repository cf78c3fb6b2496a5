//! Inference tables keyed by entity type.

use canon_core::EntityKind;

/// (kind, type keyword, temperament, status).
const TYPE_TABLE: &[(EntityKind, &str, &str, &str)] = &[
    (EntityKind::Character, "villain", "hostile", "active"),
    (EntityKind::Character, "antagonist", "hostile", "active"),
    (EntityKind::Character, "hero", "resolute", "active"),
    (EntityKind::Character, "protagonist", "resolute", "active"),
    (EntityKind::Character, "mentor", "wise", "active"),
    (EntityKind::Character, "sage", "wise", "active"),
    (EntityKind::Character, "merchant", "pragmatic", "active"),
    (EntityKind::Character, "trickster", "mercurial", "active"),
    (EntityKind::Character, "guard", "dutiful", "active"),
    (EntityKind::Character, "soldier", "dutiful", "active"),
    (EntityKind::Location, "ruin", "desolate", "abandoned"),
    (EntityKind::Location, "tavern", "lively", "open"),
    (EntityKind::Location, "temple", "solemn", "known"),
    (EntityKind::Location, "harbor", "bustling", "open"),
    (EntityKind::Location, "forest", "wild", "known"),
    (EntityKind::Organization, "guild", "mercantile", "operating"),
    (EntityKind::Organization, "cult", "secretive", "hidden"),
    (EntityKind::Organization, "order", "disciplined", "operating"),
    (EntityKind::Organization, "army", "militant", "mobilized"),
];

/// (trait, temperament) fallbacks for characters with an unknown type.
const TRAIT_TABLE: &[(&str, &str)] = &[
    ("cruel", "cold"),
    ("ruthless", "cold"),
    ("kind", "warm"),
    ("gentle", "warm"),
    ("curious", "inquisitive"),
    ("brave", "resolute"),
];

/// (description word, condition).
const CONDITION_TABLE: &[(&str, &str)] = &[
    ("wounded", "injured"),
    ("injured", "injured"),
    ("dying", "critical"),
    ("ruined", "damaged"),
    ("burned", "damaged"),
    ("besieged", "threatened"),
    ("thriving", "thriving"),
];

fn lookup(kind: EntityKind, entity_type: &str) -> Option<&'static (EntityKind, &'static str, &'static str, &'static str)> {
    let entity_type = entity_type.to_lowercase();
    TYPE_TABLE
        .iter()
        .find(|(k, keyword, _, _)| *k == kind && entity_type.contains(keyword))
}

pub fn infer_temperament(kind: EntityKind, entity_type: &str, traits: &[String]) -> &'static str {
    if let Some((_, _, temperament, _)) = lookup(kind, entity_type) {
        return *temperament;
    }
    if kind == EntityKind::Character {
        for (t, temperament) in TRAIT_TABLE {
            if traits.iter().any(|x| x == t) {
                return *temperament;
            }
        }
    }
    "unknown"
}

pub fn infer_status(kind: EntityKind, entity_type: &str, description: &str) -> &'static str {
    let text = description.to_lowercase();
    if kind == EntityKind::Character && (text.contains("deceased") || text.contains(" dead")) {
        return "deceased";
    }
    if let Some((_, _, _, status)) = lookup(kind, entity_type) {
        return *status;
    }
    match kind {
        EntityKind::Character => "active",
        EntityKind::Location => "known",
        EntityKind::Organization => "operating",
    }
}

pub fn infer_condition(description: &str) -> &'static str {
    let text = description.to_lowercase();
    CONDITION_TABLE
        .iter()
        .find(|(word, _)| text.contains(word))
        .map(|(_, condition)| *condition)
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_table_is_kind_scoped() {
        assert_eq!(infer_temperament(EntityKind::Location, "Old Ruin", &[]), "desolate");
        assert_eq!(infer_status(EntityKind::Location, "old ruin", ""), "abandoned");
        assert_eq!(infer_temperament(EntityKind::Character, "ruin", &[]), "unknown");
    }

    #[test]
    fn traits_fill_in_for_unknown_types() {
        let traits = vec!["gentle".to_string()];
        assert_eq!(infer_temperament(EntityKind::Character, "baker", &traits), "warm");
    }

    #[test]
    fn defaults_match_minimal_payload() {
        assert_eq!(infer_status(EntityKind::Organization, "", ""), "operating");
        assert_eq!(infer_condition("nothing notable"), "unknown");
    }
}
