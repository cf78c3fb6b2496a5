use canon_core::config::*;

#[test]
fn config_loads_from_empty_toml_with_all_defaults() {
    let config = CanonConfig::from_toml("").unwrap();

    // Guard defaults
    assert_eq!(config.guard.duplicate_window_ms, 500);
    assert_eq!(config.guard.stuck_ceiling_ms, 30_000);
    assert_eq!(config.guard.max_queue_len, 64);

    // Resilience defaults
    assert_eq!(config.resilience.max_retries, 3);
    assert_eq!(config.resilience.base_delay_ms, 100);
    assert_eq!(config.resilience.timeout_ms, 5_000);

    // Source defaults
    assert!(config.sources.primary.priority > config.sources.secondary.priority);
    assert_eq!(config.sources.entities_dir, "entities");

    // Storage defaults
    assert_eq!(
        config.storage.records_path,
        "consolidation/v1/master-records.json"
    );
    assert_eq!(config.storage.patterns_path, "learning/v1/patterns.json");

    // Learning defaults
    assert_eq!(config.learning.trend_threshold, 0.5);
    assert_eq!(config.learning.score_scale, 10.0);

    // Observability defaults
    assert_eq!(config.observability.log_level, "info");
    assert!(!config.observability.json_logs);
}

#[test]
fn config_loads_partial_toml_with_overrides() {
    let toml = r#"
[guard]
duplicate_window_ms = 2000

[sources.secondary]
priority = 120
reliability = 10

[observability]
json_logs = true
"#;
    let config = CanonConfig::from_toml(toml).unwrap();
    assert_eq!(config.guard.duplicate_window_ms, 2000);
    assert_eq!(config.guard.stuck_ceiling_ms, 30_000); // default
    assert_eq!(config.sources.secondary.priority, 120);
    assert_eq!(config.sources.primary.priority, 100); // default
    assert!(config.observability.json_logs);
    assert_eq!(
        config.guard.duplicate_window(),
        std::time::Duration::from_secs(2)
    );
}

#[test]
fn config_rejects_malformed_toml() {
    let err = CanonConfig::from_toml("[guard\nduplicate_window_ms = ").unwrap_err();
    assert_eq!(err.kind(), "config");
}

#[test]
fn config_toml_roundtrip() {
    let config = CanonConfig::default();
    let toml_str = config.to_toml().unwrap();
    let roundtripped = CanonConfig::from_toml(&toml_str).unwrap();
    assert_eq!(
        roundtripped.resilience.max_retries,
        config.resilience.max_retries
    );
    assert_eq!(roundtripped.storage.root_dir, config.storage.root_dir);
}

#[test]
fn config_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("canon.toml");
    std::fs::write(&path, "[resilience]\nmax_retries = 7\n").unwrap();
    let config = CanonConfig::load(&path).unwrap();
    assert_eq!(config.resilience.max_retries, 7);

    assert!(CanonConfig::load(&dir.path().join("missing.toml")).is_err());
}
