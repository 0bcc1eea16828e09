// Tests for configuration loading

use std::fs;
use std::time::Duration;

use ktop::core::config::{MonitorConfig, MAX_HISTORY_LEN};
use tempfile::TempDir;

#[test]
fn test_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config = MonitorConfig::load_from(&temp_dir.path().join("config.json")).unwrap();

    assert_eq!(config, MonitorConfig::default());
    assert_eq!(config.refresh(), Duration::from_secs(1));
    assert_eq!(config.process_interval(), Duration::from_secs(3));
    assert_eq!(config.oom_window(), Duration::from_secs(8 * 3600));
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, r#"{ "refresh_ms": 250, "top_processes": 20 }"#).unwrap();

    let config = MonitorConfig::load_from(&path).unwrap();
    assert_eq!(config.refresh_ms, 250);
    assert_eq!(config.top_processes, 20);
    assert_eq!(config.thermal_interval_ms, 5000);
    assert_eq!(config.net_peak_floor, 1024.0);
}

#[test]
fn test_zero_interval_rejected() {
    for field in ["refresh_ms", "process_interval_ms", "thermal_interval_ms", "oom_interval_ms"] {
        let json = format!(r#"{{ "{}": 0 }}"#, field);
        assert!(
            MonitorConfig::load_from_str(&json).is_err(),
            "{} = 0 should be rejected",
            field
        );
    }
}

#[test]
fn test_malformed_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(MonitorConfig::load_from(&path).is_err());
}

#[test]
fn test_zero_history_rejected() {
    assert!(MonitorConfig::load_from_str(r#"{ "history_len": 0 }"#).is_err());
    assert!(MonitorConfig::load_from_str("").is_ok());
}

#[test]
fn test_oversized_history_rejected() {
    let json = format!(r#"{{ "history_len": {} }}"#, MAX_HISTORY_LEN + 1);
    assert!(MonitorConfig::load_from_str(&json).is_err());

    let json = format!(r#"{{ "history_len": {} }}"#, MAX_HISTORY_LEN);
    assert!(MonitorConfig::load_from_str(&json).is_ok());
}

#[test]
fn test_huge_oom_window_saturates() {
    let config = MonitorConfig::load_from_str(r#"{ "oom_window_hours": 18446744073709551615 }"#)
        .unwrap();
    assert_eq!(config.oom_window(), Duration::from_secs(u64::MAX));
}
