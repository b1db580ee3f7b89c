use assistant_relay::config::AppConfig;
use serial_test::serial;
use std::env;
use std::fs;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("RELAY_SERVER__PORT");
        env::remove_var("RELAY_SERVER__HOST");
        env::remove_var("RELAY_CREDENTIALS__PATH");
        env::remove_var("RELAY_GATEWAY__BASE_URL");
        env::remove_var("RELAY_GATEWAY__POLL_INTERVAL_MS");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
        env::remove_var("CREDENTIALS_FILE");
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args(["assistant-relay"]).expect("defaults should load");

    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.credentials.path, "assistants.csv");
    assert_eq!(config.gateway.base_url, "https://api.openai.com/v1");
    assert_eq!(config.gateway.poll_interval_ms, 500);
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("RELAY_SERVER__PORT", "9090");
        env::set_var("RELAY_GATEWAY__POLL_INTERVAL_MS", "50");
    }

    let config = AppConfig::load_from_args(["assistant-relay"]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.gateway.poll_interval_ms, 50);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env_vars();
    unsafe {
        env::set_var("RELAY_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args(["assistant-relay", "--port", "7171"])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 7171);

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let config_content = r"
server:
  port: 7070
credentials:
  path: clients.csv
    ";

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = dir.path().join("relay_config.yaml");
    fs::write(&file_path, config_content).expect("Failed to write temp config");

    let config =
        AppConfig::load_from_args(["assistant-relay", "--config", file_path.to_str().unwrap()])
            .expect("Failed to load config from file");

    assert_eq!(config.server.port, 7070);
    assert_eq!(config.credentials.path, "clients.csv");
    // Unset keys keep their defaults.
    assert_eq!(config.gateway.poll_interval_ms, 500);

    clear_env_vars();
}

#[test]
#[serial]
fn test_credentials_cli_flag() {
    clear_env_vars();

    let config =
        AppConfig::load_from_args(["assistant-relay", "--credentials", "other/clients.csv"])
            .expect("Failed to load config");
    assert_eq!(config.credentials.path, "other/clients.csv");
}
