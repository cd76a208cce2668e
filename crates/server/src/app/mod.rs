//! The `PortalService` MCP service and the process entry point.

mod tools;

pub(crate) use tools::resolve_domain;

use crate::cli::{Cli, Commands, ServeArgs};
use crate::commands::{handle_query_command, handle_serve_command};
use crate::config::apply_config_to_env;
use anyhow::Result;
use clap::Parser;
use opengov_socrata::SocrataEngine;

/// Serves Socrata portal data as MCP tools.
///
/// Cloning is cheap; clones share the HTTP client and the response cache.
#[derive(Clone)]
pub struct PortalService {
    engine: SocrataEngine,
}

impl PortalService {
    pub fn new(engine: SocrataEngine) -> Self {
        Self { engine }
    }

    /// Builds the service from environment configuration.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(SocrataEngine::from_env()?))
    }

    pub fn engine(&self) -> &SocrataEngine {
        &self.engine
    }
}

/// The main entry point for the `opengov` binary.
pub fn run() -> Result<()> {
    // stdout carries the JSON-RPC stream, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    apply_config_to_env();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => handle_serve_command(args),
        Commands::Query {
            dataset_id,
            domain,
            where_clause,
            limit,
            offset,
        } => handle_query_command(dataset_id, domain, where_clause, limit, offset),
    }
}
