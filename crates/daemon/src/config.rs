// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate (§6.5).

use std::time::Duration;

/// Default bind address when `OJ_LISTEN_ADDR` is unset.
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:4287";

/// Runtime configuration resolved once at startup from environment
/// variables. Each field documents the variable and default it mirrors.
#[derive(Debug, Clone)]
pub struct Config {
    /// `OJ_LISTEN_ADDR`, default `127.0.0.1:4287`.
    pub listen_addr: String,
    /// `DB_PATH`, default `oddjobs.db` in the current directory.
    pub db_path: String,
    /// `LONG_POLL_SECONDS`, default 30.
    pub long_poll: Duration,
    /// `HEARTBEAT_TIMEOUT`, default 120s. Advertised to workers as the
    /// interval they should heartbeat at, not directly enforced here — the
    /// Reaper enforces liveness via `WORKER_STALE_AFTER`/`WORKER_REMOVE_AFTER`.
    pub heartbeat_timeout: chrono::Duration,
    /// `WORKER_STALE_AFTER`, default 120s.
    pub worker_stale_after: chrono::Duration,
    /// `WORKER_REMOVE_AFTER`, default 600s.
    pub worker_remove_after: chrono::Duration,
    /// `NO_MATCH_TIMEOUT`, default 300s.
    pub no_match_timeout: chrono::Duration,
    /// `REAPER_INTERVAL`, default 10s.
    pub reaper_interval: Duration,
    /// `CORS_ORIGINS`, comma-separated. Empty means "no CORS layer".
    pub cors_origins: Vec<String>,
    /// `AUTH_ENABLED`, default false.
    pub auth_enabled: bool,
    /// `AUTH_BEARER_TOKEN`. Required when `auth_enabled` is true; validated
    /// at startup in [`Config::from_env`].
    pub auth_bearer_token: Option<String>,
}

impl Config {
    /// Resolve configuration from the process environment, falling back to
    /// the defaults documented on each field.
    pub fn from_env() -> anyhow::Result<Self> {
        let auth_enabled = env_bool("AUTH_ENABLED", false);
        let auth_bearer_token = std::env::var("AUTH_BEARER_TOKEN").ok().filter(|s| !s.is_empty());
        if auth_enabled && auth_bearer_token.is_none() {
            anyhow::bail!("AUTH_ENABLED=true requires AUTH_BEARER_TOKEN to be set");
        }

        Ok(Self {
            listen_addr: std::env::var("OJ_LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "oddjobs.db".to_string()),
            long_poll: Duration::from_secs(env_u64("LONG_POLL_SECONDS", 30)),
            heartbeat_timeout: chrono::Duration::seconds(env_u64("HEARTBEAT_TIMEOUT", 120) as i64),
            worker_stale_after: chrono::Duration::seconds(env_u64("WORKER_STALE_AFTER", 120) as i64),
            worker_remove_after: chrono::Duration::seconds(env_u64("WORKER_REMOVE_AFTER", 600) as i64),
            no_match_timeout: chrono::Duration::seconds(env_u64("NO_MATCH_TIMEOUT", 300) as i64),
            reaper_interval: Duration::from_secs(env_u64("REAPER_INTERVAL", 10)),
            cors_origins: env_list("CORS_ORIGINS"),
            auth_enabled,
            auth_bearer_token,
        })
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok()).unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name).ok().map(|s| matches!(s.as_str(), "1" | "true" | "TRUE" | "yes")).unwrap_or(default)
}

fn env_list(name: &str) -> Vec<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
