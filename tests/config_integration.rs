//! Configuration layering tests.
//!
//! These manipulate process environment variables, so they run serially.

use parley::config::AppConfig;
use serial_test::serial;
use std::env;
use std::fs;

fn clear_env_vars() {
    // SAFETY: tests are serialized and no other thread reads these vars.
    unsafe {
        env::remove_var("PARLEY_SERVER__PORT");
        env::remove_var("PARLEY_CHAT__SYSTEM_PROMPT");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
    }
}

#[test]
#[serial]
fn default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args(["parley"]).expect("defaults should load");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.chat.system_prompt, "You are a helpful AI.");
    assert_eq!(config.chat.history_window, None);
}

#[test]
#[serial]
fn env_overrides_default() {
    clear_env_vars();
    // SAFETY: tests are serialized and no other thread reads these vars.
    unsafe {
        env::set_var("PARLEY_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args(["parley"]).expect("config should load");
    assert_eq!(config.server.port, 9090);

    clear_env_vars();
}

#[test]
#[serial]
fn cli_overrides_env() {
    clear_env_vars();
    // SAFETY: tests are serialized and no other thread reads these vars.
    unsafe {
        env::set_var("PARLEY_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args(["parley", "--port", "7171"])
        .expect("config should load");
    assert_eq!(config.server.port, 7171);

    clear_env_vars();
}

#[test]
#[serial]
fn file_load() {
    clear_env_vars();

    let config_content = r"
server:
  port: 7070
chat:
  history_window: 20
";
    let file_path = "test_config.yaml";
    fs::write(file_path, config_content).expect("failed to write temp config");

    let config = AppConfig::load_from_args(["parley", "--config", file_path])
        .expect("config should load from file");
    assert_eq!(config.server.port, 7070);
    assert_eq!(config.chat.history_window, Some(20));

    fs::remove_file(file_path).unwrap();
    clear_env_vars();
}
