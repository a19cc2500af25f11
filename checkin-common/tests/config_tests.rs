//! Integration tests for configuration resolution and graceful degradation
//!
//! Covers:
//! - Missing TOML files fall back to compiled defaults
//! - Priority order: CLI argument > environment variable > defaults
//! - Environment overrides for backend URL and API key
//! - Round trip through write_toml_config / load_toml_config
//!
//! Note: Uses serial_test to prevent ENV variable race conditions.
//! Tests that manipulate CHECKIN_* variables are marked with #[serial].

use checkin_common::config::{
    load_toml_config, write_toml_config, ConfigResolver, TomlConfig, API_KEY_ENV_VAR,
    BACKEND_URL_ENV_VAR, CONFIG_ENV_VAR,
};
use serial_test::serial;
use std::env;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(BACKEND_URL_ENV_VAR);
    env::remove_var(API_KEY_ENV_VAR);
}

#[test]
fn test_missing_file_uses_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("does-not-exist.toml");

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_malformed_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    std::fs::write(&path, "[scan\ncooldown_ms = ").unwrap();

    assert!(load_toml_config(&path).is_err());
}

#[test]
fn test_write_then_load_preserves_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let mut config = TomlConfig::default();
    config.backend.base_url = "https://demo.supabase.co".to_string();
    config.backend.api_key = Some("anon-key".to_string());
    config.scan.cooldown_ms = 35_000;
    config.decoder.commands = vec!["zbarcam --raw --nodisplay".to_string()];

    write_toml_config(&config, &path).unwrap();
    let loaded = load_toml_config(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
#[serial]
fn test_cli_path_beats_env_path() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let cli_path = temp_dir.path().join("cli.toml");
    let env_path = temp_dir.path().join("env.toml");
    std::fs::write(&cli_path, "[scan]\ncooldown_ms = 1000\n").unwrap();
    std::fs::write(&env_path, "[scan]\ncooldown_ms = 2000\n").unwrap();
    env::set_var(CONFIG_ENV_VAR, &env_path);

    let resolver = ConfigResolver::new("checkin-test");
    assert_eq!(resolver.resolve(Some(&cli_path)), Some(cli_path.clone()));

    let config = resolver.load(Some(&cli_path)).unwrap();
    assert_eq!(config.scan.cooldown_ms, 1000);

    let config = resolver.load(None).unwrap();
    assert_eq!(config.scan.cooldown_ms, 2000);

    clear_env();
}

#[test]
#[serial]
fn test_env_overrides_backend_section() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[backend]\nbase_url = \"https://file.example.com\"\napi_key = \"file-key\"\n",
    )
    .unwrap();

    env::set_var(BACKEND_URL_ENV_VAR, "https://env.example.com");
    env::set_var(API_KEY_ENV_VAR, "env-key");

    let config = ConfigResolver::new("checkin-test").load(Some(&path)).unwrap();
    assert_eq!(config.backend.base_url, "https://env.example.com");
    assert_eq!(config.backend.api_key.as_deref(), Some("env-key"));

    clear_env();
}

#[test]
#[serial]
fn test_invalid_values_fail_validation_on_load() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, "[scan]\nphone_min_digits = 16\n").unwrap();

    let result = ConfigResolver::new("checkin-test").load(Some(&path));
    assert!(result.is_err());
}
