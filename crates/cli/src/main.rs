//! Command-line interface for the `opengov` application.
//!
//! This crate serves as the main entry point for the executable, delegating
//! its core functionality to the `opengov-server` crate.

fn main() -> anyhow::Result<()> {
    opengov_server::run()
}
