// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;
use yare::parameterized;

#[test]
fn defaults() {
    let config = BusConfig::default();
    assert_eq!(config.matcher, MatcherKind::Cached);
    assert_eq!(config.cache_capacity, 1000);
    assert_eq!(config.queue_capacity, 1024);
    assert_eq!(config.max_concurrent_deliveries, 10);
    assert_eq!(config.sweep_interval, Duration::from_secs(30));
    assert_eq!(config.inactive_retention, Duration::from_secs(300));
    assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
    assert!(!config.delivery_confirmations);
}

#[test]
fn empty_document_is_default() {
    assert_eq!(BusConfig::from_toml_str("").unwrap(), BusConfig::default());
}

#[test]
fn overrides_apply_and_missing_keys_default() {
    let config = BusConfig::from_toml_str(
        r#"
matcher = "wildcard"
sweep_interval = "1m 30s"
delivery_confirmations = true
"#,
    )
    .unwrap();

    assert_eq!(config.matcher, MatcherKind::Wildcard);
    assert_eq!(config.sweep_interval, Duration::from_secs(90));
    assert!(config.delivery_confirmations);
    assert_eq!(config.cache_capacity, 1000);
}

#[parameterized(
    unknown_key = { "cache_size = 5" },
    bad_matcher = { "matcher = \"fuzzy\"" },
    bad_duration = { "shutdown_timeout = \"soon\"" },
)]
fn malformed_documents_fail_to_parse(content: &str) {
    assert!(matches!(
        BusConfig::from_toml_str(content),
        Err(ConfigError::Parse(_))
    ));
}

#[parameterized(
    no_concurrency = { "max_concurrent_deliveries = 0", "max_concurrent_deliveries" },
    no_queue = { "queue_capacity = 0", "queue_capacity" },
    no_interval = { "sweep_interval = \"0s\"", "sweep_interval" },
)]
fn unusable_values_are_rejected(content: &str, expected_field: &str) {
    match BusConfig::from_toml_str(content) {
        Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected_field),
        other => panic!("expected invalid config, got {:?}", other),
    }
}

#[test]
fn load_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "queue_capacity = 8").unwrap();
    writeln!(file, "inactive_retention = \"10s\"").unwrap();

    let config = BusConfig::load(file.path()).unwrap();
    assert_eq!(config.queue_capacity, 8);
    assert_eq!(config.sweep().retention, Duration::from_secs(10));
}

#[test]
fn load_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bus.toml");
    let err = BusConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io(ref p, _) if p == &path));
    assert!(err.to_string().contains("bus.toml"));
}

#[test]
fn builder_setters() {
    let config = BusConfig::new()
        .with_matcher(MatcherKind::Default)
        .with_cache_capacity(0)
        .with_queue_capacity(2)
        .with_max_concurrent_deliveries(1)
        .with_sweep_interval(Duration::from_secs(1))
        .with_inactive_retention(Duration::from_secs(2))
        .with_shutdown_timeout(Duration::from_millis(100))
        .with_delivery_confirmations(true);

    assert!(config.validate().is_ok());
    assert_eq!(config.matcher, MatcherKind::Default);
    assert_eq!(config.sweep().interval, Duration::from_secs(1));
    assert_eq!(config.shutdown_timeout, Duration::from_millis(100));
}

#[test]
fn round_trips_through_toml() {
    let config = BusConfig::new().with_shutdown_timeout(Duration::from_secs(2));
    let text = toml::to_string(&config).unwrap();
    assert!(text.contains("shutdown_timeout = \"2s\""));
    assert_eq!(BusConfig::from_toml_str(&text).unwrap(), config);
}
