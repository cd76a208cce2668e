//! Handler for the `serve` command.

use crate::app::PortalService;
use crate::cli::ServeArgs;
use crate::tool_schemas::portal_tools;
use anyhow::{anyhow, Result};
use opengov_socrata::CacheJanitor;
use opengov_state::{
    cache_cleanup_interval, default_domain, row_fetch_cap, ENV_CACHE_CLEANUP_MS,
    ENV_CACHE_MAX_BYTES, ENV_CACHE_TTL_MS, ENV_DOMAIN, ENV_ROW_FETCH_CAP,
};
use rmcp::service::serve_server;
use tokio::runtime::Runtime;

/// Handle the `serve` command.
pub(crate) fn handle_serve_command(args: ServeArgs) -> Result<()> {
    apply_overrides(&args);

    if args.list_tools {
        for tool in portal_tools() {
            println!(
                "{}\t{}",
                tool.name,
                tool.description.as_deref().unwrap_or_default()
            );
        }
        return Ok(());
    }

    let rt = Runtime::new()?;
    rt.block_on(async {
        let service = PortalService::from_env()?;
        let janitor =
            CacheJanitor::spawn(service.engine().cache().clone(), cache_cleanup_interval());

        tracing::info!(
            target: "opengov::startup",
            domain = %default_domain(),
            row_fetch_cap = row_fetch_cap(),
            "serving Socrata tools over stdio"
        );

        let running = serve_server(service, rmcp::transport::stdio())
            .await
            .map_err(|e| anyhow!("failed to start server: {e}"))?;
        let outcome = running
            .waiting()
            .await
            .map_err(|e| anyhow!("server task ended: {e}"));

        janitor.shutdown().await;
        outcome.map(|_| ())
    })
}

/// Flags win over both the environment and the config file.
fn apply_overrides(args: &ServeArgs) {
    let overrides = [
        (ENV_DOMAIN, args.domain.clone()),
        (ENV_ROW_FETCH_CAP, args.row_fetch_cap.map(|v| v.to_string())),
        (ENV_CACHE_TTL_MS, args.cache_ttl_ms.map(|v| v.to_string())),
        (
            ENV_CACHE_MAX_BYTES,
            args.cache_max_bytes.map(|v| v.to_string()),
        ),
        (
            ENV_CACHE_CLEANUP_MS,
            args.cache_cleanup_ms.map(|v| v.to_string()),
        ),
    ];
    for (key, value) in overrides {
        if let Some(value) = value {
            std::env::set_var(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opengov_test_utils::{env_guard, set_env_var};
    use std::time::Duration;

    #[test]
    fn test_flags_override_environment() {
        let _g = env_guard();
        let _domain = set_env_var(ENV_DOMAIN, Some("data.env.gov"));
        let _cap = set_env_var(ENV_ROW_FETCH_CAP, None);
        let _ttl = set_env_var(ENV_CACHE_TTL_MS, Some("1000"));
        let _bytes = set_env_var(ENV_CACHE_MAX_BYTES, None);
        let _cleanup = set_env_var(ENV_CACHE_CLEANUP_MS, None);

        apply_overrides(&ServeArgs {
            domain: Some("data.flag.gov".into()),
            row_fetch_cap: Some(77),
            cache_cleanup_ms: Some(250),
            ..Default::default()
        });

        assert_eq!(default_domain(), "data.flag.gov");
        assert_eq!(row_fetch_cap(), 77);
        assert_eq!(cache_cleanup_interval(), Duration::from_millis(250));
        assert_eq!(std::env::var(ENV_CACHE_TTL_MS).unwrap(), "1000");
        assert!(std::env::var(ENV_CACHE_MAX_BYTES).is_err());
    }

    #[test]
    fn test_list_tools_returns_without_serving() {
        let _g = env_guard();
        let args = ServeArgs {
            list_tools: true,
            ..Default::default()
        };
        assert!(handle_serve_command(args).is_ok());
    }
}
