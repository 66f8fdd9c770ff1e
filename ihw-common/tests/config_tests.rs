//! Configuration resolution and graceful degradation
//!
//! Tests that manipulate IHW_CONFIG are marked with #[serial] so they do not
//! race on the process environment.

use ihw_common::config::{load_toml_config, resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

#[test]
#[serial]
fn test_cli_argument_takes_precedence_over_env() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/ihw-from-env.toml");

    let cli = PathBuf::from("/tmp/ihw-from-cli.toml");
    let resolved = resolve_config_path(Some(&cli));
    assert_eq!(resolved, Some(cli));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_argument() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/ihw-from-env.toml");

    let resolved = resolve_config_path(None);
    assert_eq!(resolved, Some(PathBuf::from("/tmp/ihw-from-env.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_blank_env_var_is_ignored() {
    env::set_var(CONFIG_ENV_VAR, "   ");

    let resolved = resolve_config_path(None);
    assert_ne!(resolved, Some(PathBuf::from("   ")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let config = load_toml_config(Some(&missing)).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_no_path_uses_defaults() {
    let config = load_toml_config(None).unwrap();
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_full_file_is_parsed() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
port = 4100
bind_address = "0.0.0.0"
data_file = "/srv/ihw/curriculum.json"

[logging]
level = "debug"

[recommendation]
default_budget_minutes = 45
weak_threshold = 0.6
default_week = 3
model_version = "rules-v2"
adhoc_early_stop_ratio = 0.9
calendar_early_stop_ratio = 1.0

[external_engine]
url = "http://127.0.0.1:9000/score"
timeout_ms = 1500
"#
    )
    .unwrap();

    let config = load_toml_config(Some(file.path())).unwrap();
    assert_eq!(config.port, 4100);
    assert_eq!(config.bind_address, "0.0.0.0");
    assert_eq!(
        config.data_file,
        Some(PathBuf::from("/srv/ihw/curriculum.json"))
    );
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.recommendation.default_budget_minutes, 45);
    assert_eq!(config.recommendation.weak_threshold, 0.6);
    assert_eq!(config.recommendation.default_week, 3);
    assert_eq!(config.recommendation.model_version, "rules-v2");
    assert_eq!(config.recommendation.adhoc_early_stop_ratio, Some(0.9));
    assert_eq!(config.recommendation.calendar_early_stop_ratio, Some(1.0));
    assert_eq!(config.external_engine.timeout_ms, 1500);
}

#[test]
fn test_malformed_file_is_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = \"not a number\"").unwrap();

    assert!(load_toml_config(Some(file.path())).is_err());
}

#[test]
fn test_invalid_threshold_is_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[recommendation]\nweak_threshold = 2.0").unwrap();

    assert!(load_toml_config(Some(file.path())).is_err());
}
