//! CLI command handlers for the opengov application.

mod query;
mod serve;

pub(crate) use query::handle_query_command;
pub(crate) use serve::handle_serve_command;
