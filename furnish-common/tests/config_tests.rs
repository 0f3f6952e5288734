//! Unit tests for configuration loading and resolution priority
//!
//! Tests that manipulate FURNISH_* environment variables are marked with
//! #[serial] so they run sequentially, not in parallel.

use furnish_common::config::{
    resolve_api_base, resolve_config_path, write_toml_config, TomlConfig, API_BASE_ENV_VAR,
    CONFIG_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let config = TomlConfig::default();
    assert_eq!(config.api_base, None);
    assert_eq!(config.default_k, 8);
    assert_eq!(config.request_timeout_secs, 30);
    assert_eq!(config.image_timeout_secs, 15);
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.file.is_none());
    assert_eq!(config.delivery.proxy_param, "url");
}

#[test]
fn test_missing_file_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let config = TomlConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, None);
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "default_k = \"eight\"\n[delivery\n").unwrap();

    let err = TomlConfig::load(&path).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"), "{}", err);
}

#[test]
fn test_partial_file_fills_defaults() {
    let config = TomlConfig::from_toml_str(
        r#"
        api_base = "http://localhost:8000"
        default_k = 5

        [delivery]
        proxy_base = "http://localhost:8000/api/img"
        proxy_param = "u"
        proxy_extra_params = {}

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    assert_eq!(config.api_base.as_deref(), Some("http://localhost:8000"));
    assert_eq!(config.default_k, 5);
    assert_eq!(config.request_timeout_secs, 30);
    assert_eq!(config.delivery.proxy_base.as_str(), "http://localhost:8000/api/img");
    assert!(config.delivery.proxy_extra_params.is_empty());
    assert_eq!(
        config.delivery.placeholder_url.as_str(),
        "https://placehold.co/320x240?text=No+Image"
    );
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_invalid_proxy_base_rejected() {
    let result = TomlConfig::from_toml_str("[delivery]\nproxy_base = \"not a url\"\n");
    assert!(result.is_err());
}

#[test]
fn test_write_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = TomlConfig::default();
    config.api_base = Some("http://127.0.0.1:9000".to_string());
    config.default_k = 12;

    write_toml_config(&config, &path).unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("toml.tmp").exists());

    let loaded = TomlConfig::load(&path).unwrap();
    assert_eq!(loaded, Some(config));
}

#[test]
#[serial]
fn test_config_path_priority() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/furnish-env.toml");

    let cli = PathBuf::from("/tmp/furnish-cli.toml");
    assert_eq!(resolve_config_path(Some(&cli)), Some(cli.clone()));
    assert_eq!(
        resolve_config_path(None),
        Some(PathBuf::from("/tmp/furnish-env.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
    if let Some(path) = resolve_config_path(None) {
        assert!(path.ends_with(Path::new("furnish").join("config.toml")));
    }
}

#[test]
#[serial]
fn test_api_base_priority() {
    let mut config = TomlConfig::default();
    config.api_base = Some("http://toml.example:1/".to_string());

    env::set_var(API_BASE_ENV_VAR, "http://env.example:2");
    assert_eq!(
        resolve_api_base(Some("http://cli.example:3/"), &config).unwrap(),
        "http://cli.example:3"
    );
    assert_eq!(
        resolve_api_base(None, &config).unwrap(),
        "http://env.example:2"
    );

    env::remove_var(API_BASE_ENV_VAR);
    assert_eq!(
        resolve_api_base(None, &config).unwrap(),
        "http://toml.example:1"
    );

    config.api_base = None;
    assert_eq!(
        resolve_api_base(None, &config).unwrap(),
        "https://furnish-findr-backend.onrender.com"
    );
}

#[test]
#[serial]
fn test_api_base_must_be_http() {
    env::remove_var(API_BASE_ENV_VAR);
    let config = TomlConfig::default();
    assert!(resolve_api_base(Some("ftp://example.com"), &config).is_err());
    assert!(resolve_api_base(Some("example.com"), &config).is_err());
}
