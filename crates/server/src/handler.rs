//! MCP `ServerHandler` implementation for `PortalService`.
//!
//! - `list_tools()` advertises `get_data`, `search` and `fetch`
//! - `call_tool()` dispatches to the handlers in `app::tools`

use crate::app::PortalService;
use crate::tool_schemas::{portal_tools, FETCH, GET_DATA, SEARCH};
use opengov_socrata::Error;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, InitializeResult, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities,
};
use rmcp::ServerHandler;

/// Maps engine errors onto JSON-RPC errors, keeping the message.
pub(crate) fn to_error_data(err: &Error) -> rmcp::ErrorData {
    match err {
        Error::InvalidParams(_) => rmcp::ErrorData::invalid_params(err.to_string(), None),
        Error::RemoteFetchFailed(_) | Error::Internal(_) => {
            rmcp::ErrorData::internal_error(err.to_string(), None)
        }
    }
}

impl ServerHandler for PortalService {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            capabilities: ServerCapabilities {
                tools: Some(Default::default()),
                ..Default::default()
            },
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Socrata open-data tools. Use get_data with type=catalog to find datasets, \
                 type=column-info to learn their fields, and type=data-access to query rows with SoQL. \
                 Use search then fetch to look up individual rows."
                    .into(),
            ),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, rmcp::ErrorData>> + Send + '_
    {
        std::future::ready(Ok(ListToolsResult {
            tools: portal_tools(),
            next_cursor: None,
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: rmcp::service::RequestContext<rmcp::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, rmcp::ErrorData>> + Send + '_
    {
        Box::pin(async move {
            let name = request.name.to_string();
            tracing::debug!(target: "opengov::tools", tool = %name, "call_tool");
            let outcome = match name.as_str() {
                GET_DATA => self.get_data_tool(request.arguments).await,
                SEARCH => self.search_tool(request.arguments).await,
                FETCH => self.fetch_tool(request.arguments).await,
                other => {
                    return Err(rmcp::ErrorData::invalid_params(
                        format!("unknown tool {other}"),
                        None,
                    ))
                }
            };
            outcome.map_err(|e| {
                tracing::warn!(target: "opengov::tools", tool = %name, error = %e, "tool call failed");
                to_error_data(&e)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opengov_socrata::RemoteError;
    use rmcp::model::ErrorCode;

    #[test]
    fn test_invalid_params_map_to_invalid_params_code() {
        let data = to_error_data(&Error::InvalidParams("too many ids".into()));
        assert_eq!(data.code, ErrorCode::INVALID_PARAMS);
        assert!(data.message.contains("too many ids"));
    }

    #[test]
    fn test_remote_failures_map_to_internal_error() {
        let err = Error::RemoteFetchFailed(RemoteError::Unreachable("timed out".into()));
        let data = to_error_data(&err);
        assert_eq!(data.code, ErrorCode::INTERNAL_ERROR);
        assert!(data.message.contains("timed out"));
    }

    #[test]
    fn test_server_advertises_tools_capability() {
        let info = PortalService::new(opengov_socrata::SocrataEngine::new(
            std::sync::Arc::new(opengov_socrata::testing::MemSocrataApi::new()),
            opengov_socrata::ResponseCache::new(1024, std::time::Duration::from_secs(1)).shared(),
        ))
        .get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
    }
}
