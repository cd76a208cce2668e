//! MCP server for Socrata open-data portals.
//!
//! [`run`] parses the command line and either serves the `get_data`,
//! `search` and `fetch` tools over stdio or runs a one-off query. The tool
//! handlers live on [`PortalService`]; all data access goes through
//! `opengov_socrata::SocrataEngine`.
//!
//! Settings come from CLI flags, then environment variables, then
//! `~/.opengov/config.toml`.

mod app;
mod cli;
mod commands;
mod config;
mod handler;
mod tool_schemas;

pub use app::{run, PortalService};
pub use config::{apply_config_to_env, load_config, CacheConfig, Config, PortalConfig};
