use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DOMAIN: &str = "DATA_PORTAL_URL";
pub const ENV_ROW_FETCH_CAP: &str = "ROW_FETCH_CAP";
pub const ENV_APP_TOKEN: &str = "SOCRATA_APP_TOKEN";
pub const ENV_HTTP_TIMEOUT_MS: &str = "OPENGOV_HTTP_TIMEOUT_MS";
pub const ENV_CACHE_MAX_BYTES: &str = "OPENGOV_CACHE_MAX_BYTES";
pub const ENV_CACHE_TTL_MS: &str = "OPENGOV_CACHE_TTL_MS";
pub const ENV_CACHE_CLEANUP_MS: &str = "OPENGOV_CACHE_CLEANUP_MS";

pub const DEFAULT_DOMAIN: &str = "data.cityofchicago.org";
pub const DEFAULT_ROW_FETCH_CAP: u64 = 100_000;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_CACHE_MAX_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_CACHE_TTL_MS: u64 = 5 * 60 * 1000;
pub const DEFAULT_CACHE_CLEANUP_MS: u64 = 60 * 1000;

/// Returns the user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    #[cfg(unix)]
    if let Ok(home) = std::env::var("HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("home directory not found"))
}

/// Returns the portal domain used when a caller omits one (`DATA_PORTAL_URL`).
pub fn default_domain() -> String {
    std::env::var(ENV_DOMAIN)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_DOMAIN.to_string())
}

/// Returns the Socrata app token from `SOCRATA_APP_TOKEN`, ignoring blank values.
pub fn app_token() -> Option<String> {
    let raw = std::env::var(ENV_APP_TOKEN).ok()?;
    let token = raw.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Returns the total number of rows an `"all"` request may fetch (`ROW_FETCH_CAP`).
pub fn row_fetch_cap() -> u64 {
    parse_env(ENV_ROW_FETCH_CAP).unwrap_or(DEFAULT_ROW_FETCH_CAP)
}

/// Returns the per-request transport timeout.
pub fn http_timeout() -> Duration {
    Duration::from_millis(parse_env(ENV_HTTP_TIMEOUT_MS).unwrap_or(DEFAULT_HTTP_TIMEOUT_MS))
}

/// Returns the response cache capacity in bytes.
pub fn cache_max_bytes() -> usize {
    parse_env(ENV_CACHE_MAX_BYTES).unwrap_or(DEFAULT_CACHE_MAX_BYTES)
}

/// Returns how long a cached response stays valid.
pub fn cache_ttl() -> Duration {
    Duration::from_millis(parse_env(ENV_CACHE_TTL_MS).unwrap_or(DEFAULT_CACHE_TTL_MS))
}

/// Returns the interval between proactive cache sweeps.
pub fn cache_cleanup_interval() -> Duration {
    Duration::from_millis(parse_env(ENV_CACHE_CLEANUP_MS).unwrap_or(DEFAULT_CACHE_CLEANUP_MS))
}

/// Parses a positive integer env var. Zero and garbage are rejected with a warning.
fn parse_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => Some(v),
        _ => {
            tracing::warn!(
                target: "opengov::config",
                key,
                value = %raw,
                "ignoring invalid value; using default"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opengov_test_utils::{env_guard, set_env_var};

    #[test]
    fn row_fetch_cap_defaults_when_unset() {
        let _guard = env_guard();
        let _cap = set_env_var(ENV_ROW_FETCH_CAP, None);
        assert_eq!(row_fetch_cap(), DEFAULT_ROW_FETCH_CAP);
    }

    #[test]
    fn row_fetch_cap_reads_env_on_every_call() {
        let _guard = env_guard();
        let _cap = set_env_var(ENV_ROW_FETCH_CAP, Some("250000"));
        assert_eq!(row_fetch_cap(), 250_000);
        std::env::set_var(ENV_ROW_FETCH_CAP, "10");
        assert_eq!(row_fetch_cap(), 10);
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let _guard = env_guard();
        let _cap = set_env_var(ENV_ROW_FETCH_CAP, Some("lots"));
        let _ttl = set_env_var(ENV_CACHE_TTL_MS, Some("0"));
        assert_eq!(row_fetch_cap(), DEFAULT_ROW_FETCH_CAP);
        assert_eq!(cache_ttl(), Duration::from_millis(DEFAULT_CACHE_TTL_MS));
    }

    #[test]
    fn default_domain_ignores_blank_values() {
        let _guard = env_guard();
        let _domain = set_env_var(ENV_DOMAIN, Some("   "));
        assert_eq!(default_domain(), DEFAULT_DOMAIN);
        std::env::set_var(ENV_DOMAIN, "data.seattle.gov");
        assert_eq!(default_domain(), "data.seattle.gov");
    }

    #[test]
    fn app_token_trims_whitespace() {
        let _guard = env_guard();
        let _token = set_env_var(ENV_APP_TOKEN, Some("  abc123  "));
        assert_eq!(app_token().as_deref(), Some("abc123"));
        std::env::set_var(ENV_APP_TOKEN, " \t ");
        assert!(app_token().is_none());
    }
}
