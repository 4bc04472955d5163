//! Tests for client configuration loading.

use checkers_client::ClientConfig;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[test]
fn test_partial_file_keeps_defaults() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(
        file,
        r#"server_url = "wss://games.example.org/ws"

[reconnect]
max_attempts = 2
"#
    )
    .expect("write");

    let config = ClientConfig::from_file(file.path()).expect("Config parses");
    assert_eq!(config.server_url(), "wss://games.example.org/ws");
    assert_eq!(config.reconnect().max_attempts, Some(2));
    assert_eq!(config.reconnect().initial_delay_ms, 500);
    assert_eq!(config.credentials_path(), &PathBuf::from("credentials.json"));
}

#[test]
fn test_invalid_file_is_error() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    writeln!(file, "server_url = [").expect("write");
    let err = ClientConfig::from_file(file.path()).expect_err("Config should not parse");
    assert!(err.message.contains("Failed to parse config"));
}

#[test]
fn test_overrides_apply() {
    let config = ClientConfig::default().with_overrides(|key| match key {
        "CHECKERS_SERVER_URL" => Some("ws://override/ws".to_string()),
        "CHECKERS_CREDENTIALS" => Some("/tmp/creds.json".to_string()),
        _ => None,
    });
    assert_eq!(config.server_url(), "ws://override/ws");
    assert_eq!(config.credentials_path(), &PathBuf::from("/tmp/creds.json"));
    assert_eq!(config.refresh_url(), ClientConfig::default().refresh_url());
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = ClientConfig::load(dir.path().join("absent.toml")).expect("Defaults load");
    assert_eq!(config.log_filter(), "info,checkers_client=debug");
}
