//! Configuration file tests
//!
//! Loads, validates and saves `vibrascope.toml` files on disk.

use std::io::Write;

use vibrascope::config::validation::validate_unknown_keys;
use vibrascope::config::{defaults, ConfigError, VibrascopeConfig};
use vibrascope::types::Axis;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_full_file() {
    let file = write_config(
        r#"
[network]
ingest_addr = "127.0.0.1:7000"
feed_addr = "127.0.0.1:7001"
http_addr = "127.0.0.1:7002"

[buffer]
capacity = 8192
feed_backlog = 1024

[analysis]
sampling_rate = 25600.0
wavelet = "sym4"
levels = 6
axis = "y"

[fetch]
endpoint = "collector.local:7001"
target_count = 4096
timeout_ms = 2500
"#,
    );

    let config = VibrascopeConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.network.ingest_addr, "127.0.0.1:7000");
    assert_eq!(config.buffer.capacity, 8192);
    assert_eq!(config.buffer.feed_backlog, 1024);
    assert_eq!(config.analysis.wavelet, "sym4");
    assert_eq!(config.analysis.levels, 6);
    assert_eq!(config.analysis.axis, Axis::Y);
    assert_eq!(config.fetch.endpoint, "collector.local:7001");
    assert_eq!(config.fetch.timeout_ms, 2500);

    let settings = config.analysis.settings();
    assert_eq!(settings.sampling_rate, 25600.0);
    assert_eq!(settings.levels, 6);
}

#[test]
fn test_empty_file_is_all_defaults() {
    let file = write_config("");
    let config = VibrascopeConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config, VibrascopeConfig::default());
    assert_eq!(config.buffer.capacity, defaults::WINDOW_CAPACITY);
    assert_eq!(config.fetch.target_count, defaults::TARGET_COUNT);
    assert_eq!(config.analysis.sampling_rate, defaults::SAMPLING_RATE_HZ);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = VibrascopeConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)));
}

#[test]
fn test_syntax_error_names_the_file() {
    let file = write_config("[buffer\ncapacity = 10\n");
    let err = VibrascopeConfig::load_from_file(file.path()).unwrap_err();
    match err {
        ConfigError::Parse(path, _) => assert_eq!(path, file.path()),
        other => panic!("expected parse error, got {other}"),
    }
}

#[test]
fn test_out_of_range_values_rejected() {
    let file = write_config(
        r#"
[buffer]
capacity = 10
feed_backlog = 20

[fetch]
endpoint = "no-port"
target_count = 0
"#,
    );
    let err = VibrascopeConfig::load_from_file(file.path()).unwrap_err();
    match err {
        ConfigError::Validation(errors) => {
            assert_eq!(errors.len(), 3, "{errors:?}");
            assert!(errors.iter().any(|e| e.contains("feed_backlog")));
            assert!(errors.iter().any(|e| e.contains("fetch.endpoint")));
            assert!(errors.iter().any(|e| e.contains("target_count")));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn test_unknown_keys_warn_with_suggestion() {
    let warnings = validate_unknown_keys(
        r#"
[analysis]
sampling_rat = 1600.0
"#,
    );
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("analysis.sampling_rate")
    );

    // Unknown keys never block loading
    let file = write_config("[analysis]\nsampling_rat = 1600.0\n");
    assert!(VibrascopeConfig::load_from_file(file.path()).is_ok());
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vibrascope.toml");

    let mut config = VibrascopeConfig::default();
    config.analysis.wavelet = "db2".to_string();
    config.analysis.axis = Axis::Z;
    config.buffer.capacity = 2048;
    config.save_to_file(&path).unwrap();

    let reloaded = VibrascopeConfig::load_from_file(&path).unwrap();
    assert_eq!(reloaded, config);
}
