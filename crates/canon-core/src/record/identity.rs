//! Identity keys and deterministic master ids.

use crate::constants::{ID_HASH_LEN, MASTER_ID_PREFIX};

/// Normalize a display name into an identity key.
///
/// Case-insensitive, with whitespace and punctuation removed, so
/// `"Lady  Arwen"`, `"lady arwen"` and `"Lady-Arwen"` collapse to `"ladyarwen"`.
pub fn normalize_identity(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Deterministic master id for an identity key.
pub fn master_id_for(identity_key: &str) -> String {
    let digest = blake3::hash(identity_key.as_bytes()).to_hex();
    format!("{MASTER_ID_PREFIX}{}", &digest[..ID_HASH_LEN])
}
