use clap::{Args, Parser, Subcommand};
use opengov_socrata::RowLimit;

/// Command-line interface for the `opengov` application.
#[derive(Debug, Parser)]
#[command(
    name = "opengov",
    about = "MCP server for Socrata open-data portals",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available `opengov` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Runs as an MCP server over stdio (default).
    Serve(ServeArgs),
    /// Runs one data-access query and prints the JSON response.
    Query {
        /// Dataset identifier, e.g. `ijzp-q8t2`.
        dataset_id: String,
        /// Portal domain (overrides `DATA_PORTAL_URL`).
        #[arg(long)]
        domain: Option<String>,
        /// SoQL `$where` clause.
        #[arg(long = "where", value_name = "SOQL")]
        where_clause: Option<String>,
        /// Row count, or `all` to fetch up to the row fetch cap.
        #[arg(long, value_name = "N|all")]
        limit: Option<RowLimit>,
        #[arg(long, default_value_t = 0)]
        offset: u64,
    },
}

#[derive(Debug, Default, Args)]
pub struct ServeArgs {
    /// Default portal domain (overrides `DATA_PORTAL_URL`).
    #[arg(long, value_name = "DOMAIN")]
    pub domain: Option<String>,
    /// Most rows a `limit: "all"` request may fetch (overrides `ROW_FETCH_CAP`).
    #[arg(long, value_name = "ROWS")]
    pub row_fetch_cap: Option<u64>,
    /// Response cache TTL in milliseconds (overrides `OPENGOV_CACHE_TTL_MS`).
    #[arg(long, value_name = "MILLIS")]
    pub cache_ttl_ms: Option<u64>,
    /// Response cache capacity in bytes (overrides `OPENGOV_CACHE_MAX_BYTES`).
    #[arg(long, value_name = "BYTES")]
    pub cache_max_bytes: Option<usize>,
    /// Interval between expired-entry sweeps (overrides `OPENGOV_CACHE_CLEANUP_MS`).
    #[arg(long, value_name = "MILLIS")]
    pub cache_cleanup_ms: Option<u64>,
    /// Prints the tool list and exits.
    #[arg(long, default_value_t = false)]
    pub list_tools: bool,
}
