//! Test fixtures for Canon: golden payload sets, fake sources and stores,
//! and payload builders.
//!
//! Golden files live under `data/` in this crate and are loaded by path
//! relative to it, so every crate in the workspace sees the same set.

pub mod builders;
pub mod fakes;

use std::path::PathBuf;

use serde::de::DeserializeOwned;

pub use builders::{at, PayloadBuilder};
pub use fakes::{FailingEnricher, FakePrimarySource, FlakyStore};

/// Root directory of the golden data.
fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Load a fixture file as raw JSON.
pub fn load_fixture_value(relative_path: &str) -> serde_json::Value {
    load_fixture(relative_path)
}

/// Load a fixture file holding an array of raw payloads.
pub fn load_payloads(relative_path: &str) -> Vec<serde_json::Value> {
    load_fixture(relative_path)
}

pub fn fixture_exists(relative_path: &str) -> bool {
    fixtures_root().join(relative_path).exists()
}

pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// JSON files in a fixture subdirectory, sorted.
pub fn list_fixtures(subdir: &str) -> Vec<PathBuf> {
    let dir = fixtures_root().join(subdir);
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("Failed to read directory {}: {}", dir.display(), e))
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            path.extension().is_some_and(|ext| ext == "json").then_some(path)
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn golden_sets_parse_as_payload_arrays() {
        for path in list_fixtures("consolidation") {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            let payloads = load_payloads(&format!("consolidation/{name}"));
            assert!(!payloads.is_empty(), "{name} is empty");
        }
        assert!(fixture_exists("consolidation/primary.json"));
    }
}
