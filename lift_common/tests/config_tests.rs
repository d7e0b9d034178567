//! Simulator config file tests.
//!
//! Tests for `SimFileConfig::load_validated()`: full file, partial file
//! with defaults, bounds validation, unknown fields rejection.

use lift_common::config::{ConfigError, LogLevel};
use lift_common::hal::config::SimFileConfig;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("lift.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_full_config_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[shared]
log_level = "debug"
service_name = "lift-sim-test"

[sim]
num_floors = 6
start_floor = 2
com_port = 9999
floor_spacing = 3.0
travel_time_between_floors_ms = 1500
travel_time_passing_floors_ms = 300
btn_depressed_time_ms = 150
tick_period_ms = 5
slack_margin = 0.25
query_timeout_ms = 400
"#,
    );

    let (shared, sim) = SimFileConfig::load_validated(&path).unwrap();
    assert_eq!(shared.log_level, LogLevel::Debug);
    assert_eq!(shared.service_name, "lift-sim-test");
    assert_eq!(sim.num_floors, 6);
    assert_eq!(sim.start_floor, 2);
    assert_eq!(sim.com_port, 9999);
    assert_eq!(sim.travel_time_between_floors, Duration::from_millis(1500));
    assert_eq!(sim.tick_period, Duration::from_millis(5));
    assert_eq!(sim.query_timeout, Duration::from_millis(400));
    assert!((sim.shaft_height() - 18.0).abs() < 1e-12);
}

#[test]
fn test_partial_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[sim]\nnum_floors = 9\n");

    let (shared, sim) = SimFileConfig::load_validated(&path).unwrap();
    assert_eq!(shared.log_level, LogLevel::Info);
    assert_eq!(sim.num_floors, 9);
    assert_eq!(sim.start_floor, 0);
}

#[test]
fn test_out_of_range_floor_count_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[sim]\nnum_floors = 1\n");

    let result = SimFileConfig::load_validated(&path);
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_start_floor_outside_building_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[sim]\nnum_floors = 3\nstart_floor = 3\n");

    let result = SimFileConfig::load_validated(&path);
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_illegal_port_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[sim]\ncom_port = 80\n");

    let err = SimFileConfig::load_validated(&path).unwrap_err();
    assert!(err.to_string().contains("illegal port"));
}

#[test]
fn test_unknown_sim_field_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[sim]\nnumFloors = 4\n");

    let result = SimFileConfig::load_validated(&path);
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn test_empty_service_name_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[shared]\nservice_name = \"\"\n");

    let result = SimFileConfig::load_validated(&path);
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}
