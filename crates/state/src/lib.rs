//! Runtime settings for the opengov server.
//!
//! Every accessor reads the environment at the moment it is called, so a
//! changed value takes effect on the next request without a restart.

pub mod env;

pub use env::{
    app_token, cache_cleanup_interval, cache_max_bytes, cache_ttl, default_domain, home_dir,
    http_timeout, row_fetch_cap, DEFAULT_CACHE_CLEANUP_MS, DEFAULT_CACHE_MAX_BYTES,
    DEFAULT_CACHE_TTL_MS, DEFAULT_DOMAIN, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_ROW_FETCH_CAP,
    ENV_APP_TOKEN, ENV_CACHE_CLEANUP_MS, ENV_CACHE_MAX_BYTES, ENV_CACHE_TTL_MS, ENV_DOMAIN,
    ENV_HTTP_TIMEOUT_MS, ENV_ROW_FETCH_CAP,
};
