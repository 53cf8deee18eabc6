//! Unit tests for client configuration

use std::io::Write;
use std::path::Path;

use registro_client::{load_config, AdminConfig, ApiConfig, Config, ReconnectConfig, RegistroError};

#[test]
fn test_api_config_default() {
    let config = ApiConfig::default();
    assert_eq!(config.base_url, "http://localhost:3000/api");
    assert_eq!(config.ws_url, "ws://localhost:3000");
    assert_eq!(config.timeout_ms, 10_000);
    assert_eq!(config.ws_endpoint(), "ws://localhost:3000/ws");
}

#[test]
fn test_ws_endpoint_trims_trailing_slash() {
    let config = ApiConfig {
        ws_url: "wss://registro.example.org/".to_string(),
        ..Default::default()
    };
    assert_eq!(config.ws_endpoint(), "wss://registro.example.org/ws");
}

#[test]
fn test_reconnect_config_default() {
    let config = ReconnectConfig::default();
    assert!(config.enabled);
    assert_eq!(config.max_attempts, 5);
    assert_eq!(config.interval_ms, 1_000);
}

#[test]
fn test_admin_config_default_is_locked() {
    let config = AdminConfig::default();
    assert!(config.password.is_none());
    assert_eq!(config.stats_refresh_ms, 5_000);
}

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.api.base_url, "http://localhost:3000/api");
    assert_eq!(config.reconnect.max_attempts, 5);
    assert_eq!(
        config.storage.path,
        Path::new("registro-storage.json").to_path_buf()
    );
}

#[test]
fn test_partial_json_fills_defaults() {
    let config: Config = serde_json::from_str(
        r#"{"api": {"base_url": "https://registro.example.org/api"}, "reconnect": {"max_attempts": 3}}"#,
    )
    .unwrap();
    assert_eq!(config.api.base_url, "https://registro.example.org/api");
    assert_eq!(config.api.ws_url, "ws://localhost:3000");
    assert_eq!(config.reconnect.max_attempts, 3);
    assert_eq!(config.reconnect.interval_ms, 1_000);
    assert!(config.admin.password.is_none());
}

#[test]
fn test_reconnect_config_serialization() {
    let config = ReconnectConfig {
        enabled: false,
        max_attempts: 2,
        interval_ms: 250,
    };
    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["enabled"], false);
    assert_eq!(json["max_attempts"], 2);
    assert_eq!(json["interval_ms"], 250);
}

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"admin": {{"password": "s3creto"}}, "storage": {{"path": "/tmp/registro.json"}}}}"#
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.admin.password.as_deref(), Some("s3creto"));
    assert_eq!(config.storage.path, Path::new("/tmp/registro.json"));
    assert_eq!(config.api.timeout_ms, 10_000);
}

#[test]
fn test_load_config_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, RegistroError::Config(ref m) if m.starts_with("Failed to read")));
}

#[test]
fn test_load_config_invalid_json() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "not json").unwrap();

    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, RegistroError::Json(_)));
}

#[test]
fn test_load_config_rejects_zero_stats_refresh() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"admin": {{"stats_refresh_ms": 0}}}}"#).unwrap();

    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, RegistroError::Config(ref m) if m.contains("stats_refresh_ms")));
}
