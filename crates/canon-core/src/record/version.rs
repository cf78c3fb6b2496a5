//! `major.minor.patch` handling for `master_version`.

use crate::errors::{CanonResult, RecordError};

/// Increment the patch component: `"1.0.4"` → `"1.0.5"`.
pub fn bump_patch(version: &str) -> CanonResult<String> {
    let (major, minor, patch) = parse(version)?;
    Ok(format!("{major}.{minor}.{}", patch + 1))
}

/// Parse a semantic version triple.
pub fn parse(version: &str) -> CanonResult<(u64, u64, u64)> {
    let invalid = || RecordError::InvalidVersion {
        version: version.to_string(),
    };
    let mut parts = version.trim().split('.');
    let mut next = || -> CanonResult<u64> {
        parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(|| invalid().into())
    };
    let triple = (next()?, next()?, next()?);
    if parts.next().is_some() {
        return Err(invalid().into());
    }
    Ok(triple)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bumps_patch_only() {
        assert_eq!(bump_patch("1.0.0").unwrap(), "1.0.1");
        assert_eq!(bump_patch("2.3.9").unwrap(), "2.3.10");
    }

    #[test]
    fn rejects_malformed_versions() {
        assert!(bump_patch("1.0").is_err());
        assert!(bump_patch("1.0.0.0").is_err());
        assert!(bump_patch("one.two.three").is_err());
    }
}
