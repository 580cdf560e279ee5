//! Integration tests for configuration loading
//!
//! Tests that verify config loading from files and environment variables.

use serial_test::serial;
use std::path::PathBuf;
use tumble::config::{AppConfig, ConfigError};
use tumble_physics::Broadphase;

/// Fresh config directory holding only a `user.toml`
fn user_config_dir(name: &str, user_toml: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tumble-config-{}-{}", std::process::id(), name));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("user.toml"), user_toml).unwrap();
    dir
}

#[test]
#[serial]
fn test_env_override() {
    std::env::set_var("TUMBLE_PHYSICS__GRAVITY", "-4.5");
    std::env::set_var("TUMBLE_ARENA__BOUNDARY_RADIUS", "7.5");
    let config = AppConfig::load();
    std::env::remove_var("TUMBLE_PHYSICS__GRAVITY");
    std::env::remove_var("TUMBLE_ARENA__BOUNDARY_RADIUS");

    let config = config.unwrap();
    assert_eq!(config.physics.gravity, -4.5);
    assert_eq!(config.arena.boundary_radius, 7.5);
}

#[test]
#[serial]
fn test_default_file_matches_builtin_defaults() {
    let config = AppConfig::load().unwrap();
    let builtin = AppConfig::default();

    assert_eq!(config.physics.gravity, builtin.physics.gravity);
    assert_eq!(config.physics.broadphase, Broadphase::SweepAndPrune);
    assert_eq!(config.materials, builtin.materials);
    assert_eq!(config.contacts, builtin.contacts);
    assert_eq!(config.audio.banks, builtin.audio.banks);
    assert!(config.contact_policy().is_ok());
}

#[test]
#[serial]
fn test_missing_directory_uses_defaults() {
    let config = AppConfig::load_from("does/not/exist").unwrap();
    assert_eq!(config.physics.max_substeps, 3);
    assert_eq!(config.materials.len(), 3);
}

#[test]
#[serial]
fn test_invalid_env_value_is_rejected() {
    std::env::set_var("TUMBLE_PHYSICS__MAX_SUBSTEPS", "0");
    let result = AppConfig::load();
    std::env::remove_var("TUMBLE_PHYSICS__MAX_SUBSTEPS");

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
#[serial]
fn test_user_file_overrides_defaults() {
    let dir = user_config_dir("override", "[arena]\nboundary_radius = 9.0\n");
    let config = AppConfig::load_from(&dir);
    std::fs::remove_dir_all(&dir).unwrap();

    assert_eq!(config.unwrap().arena.boundary_radius, 9.0);
}

#[test]
#[serial]
fn test_invalid_user_value_is_rejected() {
    let dir = user_config_dir("substeps", "[physics]\nmax_substeps = 0\n");
    let result = AppConfig::load_from(&dir);
    std::fs::remove_dir_all(&dir).unwrap();

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
#[serial]
fn test_nan_frame_delta_is_rejected() {
    let dir = user_config_dir("frame-delta", "[physics]\nmax_frame_delta = nan\n");
    let result = AppConfig::load_from(&dir);
    std::fs::remove_dir_all(&dir).unwrap();

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
#[serial]
fn test_malformed_user_file_is_load_error() {
    let dir = user_config_dir("malformed", "[physics\ngravity = \n");
    let result = AppConfig::load_from(&dir);
    std::fs::remove_dir_all(&dir).unwrap();

    assert!(matches!(result, Err(ConfigError::Load(_))));
}
