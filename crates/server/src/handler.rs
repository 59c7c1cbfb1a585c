//! MCP server handler implementation.
//!
//! Routes tool calls to the interception host.
use std::sync::Arc;

use crate::tools::cache::{CacheGetParams, generations_impl, get_impl};
use crate::tools::fetch::{CacheFetchParams, fetch_impl};

use intercache_client::ServiceHost;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The MCP server handler for intercache.
#[derive(Clone)]
pub struct IntercacheServer {
    host: Arc<ServiceHost>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl IntercacheServer {
    /// Create a new server handler around an installed host.
    pub fn new(host: Arc<ServiceHost>) -> Self {
        Self { host, tool_router: Self::tool_router() }
    }

    /// Send a request through the interception cache.
    #[tool(
        description = "Fetch a URL through the offline cache. Returns status, where the response came from, the routing policy and the body."
    )]
    async fn cache_fetch(&self, params: Parameters<CacheFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.host, params.0).await
    }

    /// Inspect the stored entry for a URL in the current generation.
    #[tool(description = "Show the cached entry for a URL in the current cache generation, without touching the network.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.host, params.0).await
    }

    /// List stored generations.
    #[tool(description = "List stored cache generations and the current one.")]
    async fn cache_generations(&self) -> Result<CallToolResult, McpError> {
        generations_impl(&self.host).await
    }
}

impl ServerHandler for IntercacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "intercache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
