//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker host and the cache views.
use std::sync::Arc;

use crate::tools::cache::{CacheListParams, CacheMatchParams, list_impl, match_impl};
use crate::tools::{WorkerFetchParams, fetch_impl, install_impl};

use readthrough_core::{CacheStorage, WorkerConfig, WorkerHost};
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

/// The main MCP server handler for the readthrough host.
#[derive(Clone)]
pub struct ReadthroughServer {
    tool_router: ToolRouter<Self>,
    host: Arc<WorkerHost>,
    storage: Arc<dyn CacheStorage>,
    worker_config: Arc<WorkerConfig>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl ReadthroughServer {
    /// Create a new server handler around a registered worker.
    pub fn new(host: Arc<WorkerHost>, storage: Arc<dyn CacheStorage>, worker_config: Arc<WorkerConfig>) -> Self {
        Self { tool_router: Self::tool_router(), host, storage, worker_config }
    }

    /// Dispatch the install event.
    ///
    /// Prefetches every configured asset into the current cache generation.
    /// The worker only becomes active if every asset was stored.
    #[tool(description = "Install the worker: prefetch all configured assets into the cache. All-or-nothing.")]
    async fn worker_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.host).await
    }

    #[tool(
        description = "Fetch a URL through the worker. Served from cache on a hit, from the network on a miss. Cache misses are not stored."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.host, &self.worker_config.scope, params.0).await
    }

    #[tool(description = "Look up a URL in a cache generation without touching the network.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(self.storage.as_ref(), &self.worker_config, params.0).await
    }

    #[tool(description = "List cache generations and the entries stored in one of them.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        list_impl(self.storage.as_ref(), &self.worker_config, params.0).await
    }
}

impl ServerHandler for ReadthroughServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "readthrough".into(),
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
