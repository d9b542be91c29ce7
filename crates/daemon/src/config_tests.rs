// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn clear_all() {
    for var in [
        "OJ_LISTEN_ADDR",
        "DB_PATH",
        "LONG_POLL_SECONDS",
        "HEARTBEAT_TIMEOUT",
        "WORKER_STALE_AFTER",
        "WORKER_REMOVE_AFTER",
        "NO_MATCH_TIMEOUT",
        "REAPER_INTERVAL",
        "CORS_ORIGINS",
        "AUTH_ENABLED",
        "AUTH_BEARER_TOKEN",
    ] {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn defaults_when_unset() {
    clear_all();
    let config = Config::from_env().expect("defaults should resolve");
    assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
    assert_eq!(config.long_poll, Duration::from_secs(30));
    assert_eq!(config.worker_stale_after, chrono::Duration::seconds(120));
    assert_eq!(config.worker_remove_after, chrono::Duration::seconds(600));
    assert_eq!(config.no_match_timeout, chrono::Duration::seconds(300));
    assert!(!config.auth_enabled);
    assert!(config.cors_origins.is_empty());
}

#[test]
#[serial]
fn parses_overrides() {
    clear_all();
    std::env::set_var("OJ_LISTEN_ADDR", "0.0.0.0:9000");
    std::env::set_var("LONG_POLL_SECONDS", "5");
    std::env::set_var("CORS_ORIGINS", "https://a.example, https://b.example");

    let config = Config::from_env().expect("overrides should resolve");
    assert_eq!(config.listen_addr, "0.0.0.0:9000");
    assert_eq!(config.long_poll, Duration::from_secs(5));
    assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
    clear_all();
}

#[test]
#[serial]
fn auth_enabled_without_token_is_rejected() {
    clear_all();
    std::env::set_var("AUTH_ENABLED", "true");
    let err = Config::from_env().expect_err("missing token should fail");
    assert!(err.to_string().contains("AUTH_BEARER_TOKEN"));
    clear_all();
}

#[test]
#[serial]
fn auth_enabled_with_token_succeeds() {
    clear_all();
    std::env::set_var("AUTH_ENABLED", "true");
    std::env::set_var("AUTH_BEARER_TOKEN", "secret");
    let config = Config::from_env().expect("token present");
    assert!(config.auth_enabled);
    assert_eq!(config.auth_bearer_token.as_deref(), Some("secret"));
    clear_all();
}
