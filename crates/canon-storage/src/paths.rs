//! Store path validation.

use canon_core::errors::{CanonResult, StorageError};

/// Split a `/`-separated store path into components, rejecting anything that
/// could escape the store root.
pub fn components(path: &str) -> CanonResult<Vec<&str>> {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    let invalid = parts.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || parts.iter().any(|p| *p == "." || *p == "..");
    if invalid {
        return Err(StorageError::InvalidPath {
            path: path.to_string(),
        }
        .into());
    }
    Ok(parts)
}

/// Canonical form of a store path (`a//b/` → `a/b`).
pub fn normalize(path: &str) -> CanonResult<String> {
    Ok(components(path)?.join("/"))
}
