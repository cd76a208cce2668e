//! Configuration file support for opengov.
//!
//! Loads settings from `~/.opengov/config.toml` with the following precedence:
//! CLI arguments > Environment variables > Config file
//!
//! ## Configuration File Format
//!
//! ```toml
//! # ~/.opengov/config.toml
//!
//! [portal]
//! # Portal used when a tool call omits `domain`
//! domain = "data.seattle.gov"
//! # Sent as X-App-Token to raise Socrata rate limits
//! app_token = "your-app-token"
//! # Most rows a `limit: "all"` request may fetch
//! row_fetch_cap = 250000
//!
//! [cache]
//! max_bytes = 52428800
//! ttl_ms = 300000
//! cleanup_interval_ms = 60000
//! ```

use anyhow::{Context, Result};
use opengov_state::{
    ENV_APP_TOKEN, ENV_CACHE_CLEANUP_MS, ENV_CACHE_MAX_BYTES, ENV_CACHE_TTL_MS, ENV_DOMAIN,
    ENV_ROW_FETCH_CAP,
};
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level configuration structure.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct PortalConfig {
    pub domain: Option<String>,
    pub app_token: Option<String>,
    pub row_fetch_cap: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CacheConfig {
    pub max_bytes: Option<usize>,
    pub ttl_ms: Option<u64>,
    pub cleanup_interval_ms: Option<u64>,
}

/// Returns the path to the config file (~/.opengov/config.toml).
fn config_path() -> Option<PathBuf> {
    opengov_state::home_dir()
        .ok()
        .map(|h| h.join(".opengov").join("config.toml"))
}

/// Loads the configuration file if it exists.
///
/// Returns `Ok(None)` if the file doesn't exist and `Err` if it exists but
/// fails to parse.
pub fn load_config() -> Result<Option<Config>> {
    let Some(path) = config_path() else {
        return Ok(None);
    };

    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))?;

    tracing::debug!(
        target: "opengov::config",
        path = %path.display(),
        "Loaded configuration file"
    );

    Ok(Some(config))
}

/// Applies configuration file settings to environment variables.
///
/// Only sets variables that are not already set. Call before parsing CLI
/// arguments.
pub fn apply_config_to_env() {
    match load_config() {
        Ok(Some(config)) => apply_to_env(&config),
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(target: "opengov::config", error = %e, "ignoring config file");
        }
    }
}

fn apply_to_env(config: &Config) {
    fn set_if_absent(key: &str, value: &str) {
        if std::env::var(key).is_err() {
            std::env::set_var(key, value);
            tracing::trace!(
                target: "opengov::config",
                key,
                "Set environment variable from config file"
            );
        }
    }

    let portal = &config.portal;
    if let Some(ref domain) = portal.domain {
        set_if_absent(ENV_DOMAIN, domain);
    }
    if let Some(ref token) = portal.app_token {
        set_if_absent(ENV_APP_TOKEN, token);
    }
    if let Some(cap) = portal.row_fetch_cap {
        set_if_absent(ENV_ROW_FETCH_CAP, &cap.to_string());
    }

    let cache = &config.cache;
    if let Some(bytes) = cache.max_bytes {
        set_if_absent(ENV_CACHE_MAX_BYTES, &bytes.to_string());
    }
    if let Some(ttl) = cache.ttl_ms {
        set_if_absent(ENV_CACHE_TTL_MS, &ttl.to_string());
    }
    if let Some(every) = cache.cleanup_interval_ms {
        set_if_absent(ENV_CACHE_CLEANUP_MS, &every.to_string());
    }
}
