//! Unit tests for configuration and graceful degradation
//!
//! Covers:
//! - Missing TOML files do not cause termination (defaults are used)
//! - Malformed TOML files are reported as configuration errors
//! - Priority order for root folder resolution (CLI → ENV → TOML → default)
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate VCD_ROOT_FOLDER are marked with #[serial].

use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vcd_common::config::{default_root_folder, load_toml_config, resolve_root_folder, LoggingConfig};
use vcd_common::Error;

const ENV_VAR: &str = "VCD_ROOT_FOLDER";

#[derive(Debug, Default, Deserialize)]
struct ModuleToml {
    #[serde(default)]
    root_folder: Option<PathBuf>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    logging: LoggingConfig,
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ENV_VAR);

    let root = resolve_root_folder(None, ENV_VAR, None);

    assert!(!root.as_os_str().is_empty());
    assert_eq!(root, default_root_folder());
}

#[test]
#[serial]
fn test_resolver_cli_wins_over_env_and_toml() {
    env::set_var(ENV_VAR, "/tmp/vcd-env-folder");

    let root = resolve_root_folder(
        Some(Path::new("/tmp/vcd-cli-folder")),
        ENV_VAR,
        Some(Path::new("/tmp/vcd-toml-folder")),
    );
    assert_eq!(root, PathBuf::from("/tmp/vcd-cli-folder"));

    env::remove_var(ENV_VAR);
}

#[test]
#[serial]
fn test_resolver_env_wins_over_toml() {
    env::set_var(ENV_VAR, "/tmp/vcd-env-folder");

    let root = resolve_root_folder(None, ENV_VAR, Some(Path::new("/tmp/vcd-toml-folder")));
    assert_eq!(root, PathBuf::from("/tmp/vcd-env-folder"));

    env::remove_var(ENV_VAR);
}

#[test]
#[serial]
fn test_resolver_blank_env_falls_through_to_toml() {
    env::set_var(ENV_VAR, "   ");

    let root = resolve_root_folder(None, ENV_VAR, Some(Path::new("/tmp/vcd-toml-folder")));
    assert_eq!(root, PathBuf::from("/tmp/vcd-toml-folder"));

    env::remove_var(ENV_VAR);
}

#[test]
fn test_load_toml_config_reads_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("vcd-detect.toml");
    std::fs::write(
        &path,
        r#"
root_folder = "/srv/vcd"
port = 5100

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config: ModuleToml = load_toml_config(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/vcd")));
    assert_eq!(config.port, Some(5100));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_load_toml_config_partial_file_keeps_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("vcd-detect.toml");
    std::fs::write(&path, "port = 5001\n").unwrap();

    let config: ModuleToml = load_toml_config(&path).unwrap();
    assert_eq!(config.port, Some(5001));
    assert!(config.root_folder.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_load_toml_config_malformed_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "port = [this is not toml").unwrap();

    let result: Result<ModuleToml, Error> = load_toml_config(&path);
    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("Parse")),
        other => panic!("Expected Config error, got {:?}", other),
    }
}
