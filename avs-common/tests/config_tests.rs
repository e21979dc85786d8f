//! Configuration loading tests
//!
//! Tests touching `AVS_*` / `OLLAMA_*` environment variables are marked
//! `#[serial]` so they never run in parallel with each other.

use std::env;
use std::io::Write;

use avs_common::config::{ServerConfig, CONFIG_ENV_VAR};
use avs_common::Error;
use serial_test::serial;
use tempfile::NamedTempFile;

const OVERRIDE_VARS: &[&str] = &[
    CONFIG_ENV_VAR,
    "AVS_BIND",
    "AVS_ANKICONNECT_URL",
    "AVS_ADDON_URL",
    "OLLAMA_API_BASE",
    "OLLAMA_MODEL",
    "AVS_EXPLAIN_ENABLED",
];

fn clear_env() {
    for var in OVERRIDE_VARS {
        env::remove_var(var);
    }
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_explicit_config_file() {
    clear_env();
    let file = write_config(
        r#"
        bind = "127.0.0.1:8123"

        [anki]
        connect_url = "http://10.0.0.5:8765"
        gui_timeout_ms = 6000

        [explain]
        enabled = false
        model = "mistral:7b"
        "#,
    );

    let config = ServerConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.bind, "127.0.0.1:8123");
    assert_eq!(config.anki.connect_url, "http://10.0.0.5:8765");
    assert_eq!(config.anki.gui_timeout_ms, 6000);
    assert_eq!(config.anki.data_timeout_ms, 2000);
    assert!(!config.explain.enabled);
    assert_eq!(config.explain.model, "mistral:7b");
    assert_eq!(config.explain.timeout_secs, 45);
}

#[test]
#[serial]
fn test_config_path_from_env() {
    clear_env();
    let file = write_config("[language]\ndefault = \"de-DE\"\n");
    env::set_var(CONFIG_ENV_VAR, file.path());

    let config = ServerConfig::load(None).unwrap();
    assert_eq!(config.language.default, "de-DE");

    clear_env();
}

#[test]
#[serial]
fn test_cli_path_beats_env_path() {
    clear_env();
    let env_file = write_config("bind = \"127.0.0.1:1111\"\n");
    let cli_file = write_config("bind = \"127.0.0.1:2222\"\n");
    env::set_var(CONFIG_ENV_VAR, env_file.path());

    let config = ServerConfig::load(Some(cli_file.path())).unwrap();
    assert_eq!(config.bind, "127.0.0.1:2222");

    clear_env();
}

#[test]
#[serial]
fn test_missing_explicit_file_is_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = ServerConfig::load(Some(&missing)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn test_unparsable_file_is_error() {
    clear_env();
    let file = write_config("[anki\nconnect_url = 3");
    assert!(matches!(
        ServerConfig::load(Some(file.path())),
        Err(Error::Config(_))
    ));
}

#[test]
#[serial]
fn test_env_overrides_apply_after_file() {
    clear_env();
    let file = write_config(
        r#"
        bind = "127.0.0.1:8123"
        [explain]
        base_url = "http://from-file:11434"
        "#,
    );
    env::set_var("AVS_BIND", "0.0.0.0:9999");
    env::set_var("AVS_ANKICONNECT_URL", "http://anki.lan:8765");
    env::set_var("AVS_ADDON_URL", "http://anki.lan:8770");
    env::set_var("OLLAMA_API_BASE", "http://gpu-box:11434");
    env::set_var("OLLAMA_MODEL", "llama3:8b");
    env::set_var("AVS_EXPLAIN_ENABLED", "0");

    let config = ServerConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.bind, "0.0.0.0:9999");
    assert_eq!(config.anki.connect_url, "http://anki.lan:8765");
    assert_eq!(config.anki.addon_url, "http://anki.lan:8770");
    assert_eq!(config.explain.base_url, "http://gpu-box:11434");
    assert_eq!(config.explain.model, "llama3:8b");
    assert!(!config.explain.enabled);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_explain_flag_is_ignored() {
    clear_env();
    env::set_var("AVS_EXPLAIN_ENABLED", "sometimes");

    let mut config = ServerConfig::default();
    config.apply_env_overrides();
    assert!(config.explain.enabled);

    clear_env();
}

#[test]
#[serial]
fn test_blank_env_values_are_ignored() {
    clear_env();
    env::set_var("AVS_BIND", "   ");

    let mut config = ServerConfig::default();
    config.apply_env_overrides();
    assert_eq!(config.bind, "0.0.0.0:8000");

    clear_env();
}
