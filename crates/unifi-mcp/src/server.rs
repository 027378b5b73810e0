//! The MCP server: answers `tools/list` and `tools/call` from a registry.

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, ErrorData, ListToolsResult, PaginatedRequestParams,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler, ServiceExt};
use serde_json::Value;

use crate::guide;
use crate::registry::{CompositeRegistry, ToolRegistry};

/// Identity reported to MCP clients.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: crate::config::PROJECT_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// MCP server over a tool registry.
pub struct UnifiMcpServer {
    registry: Arc<CompositeRegistry>,
    config: ServerConfig,
}

impl UnifiMcpServer {
    /// Serve the tools in `registry`.
    pub fn new(registry: CompositeRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            config: ServerConfig::default(),
        }
    }

    /// Set the server name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the server version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.config.version = version.into();
        self
    }

    /// Server identity.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The tool registry.
    pub fn registry(&self) -> &CompositeRegistry {
        &self.registry
    }

    /// Run over stdin/stdout until the client disconnects.
    pub async fn serve_stdio(self) -> anyhow::Result<()> {
        tracing::info!(
            name = %self.config.name,
            version = %self.config.version,
            tools = self.registry.tool_count(),
            "serving MCP over stdio"
        );
        let service = self.serve(rmcp::transport::stdio()).await?;
        service.waiting().await?;
        tracing::info!("MCP client disconnected");
        Ok(())
    }

    /// Dispatch one tool call. Unknown names are a protocol error.
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<CallToolResult, ErrorData> {
        tracing::debug!(tool = name, "tool call");
        match self.registry.call(name, args) {
            Some(call) => call.await,
            None => {
                tracing::warn!(tool = name, "unknown tool");
                Err(ErrorData::invalid_params(
                    format!("Unknown tool: {name}"),
                    None,
                ))
            }
        }
    }
}

impl ServerHandler for UnifiMcpServer {
    #[allow(clippy::field_reassign_with_default)]
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info.name = self.config.name.clone();
        info.server_info.version = self.config.version.clone();
        info.instructions = Some(guide::instructions());
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.registry.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let args = request.arguments.map(Value::Object).unwrap_or(Value::Null);
        self.dispatch(&request.name, args).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tools::build_registry;
    use crate::tools::common::{result_json, test_context};
    use rmcp::model::ErrorCode;
    use serde_json::json;
    use unifi_client::MockController;

    fn server() -> UnifiMcpServer {
        let mock = Arc::new(MockController::new());
        UnifiMcpServer::new(build_registry(test_context(&mock), "unifi-mcp", "0.3.0"))
            .with_version("0.3.0")
    }

    #[test]
    fn test_info_advertises_tools_and_instructions() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, "unifi-mcp");
        assert_eq!(info.server_info.version, "0.3.0");
        assert!(
            info.instructions
                .unwrap()
                .contains("unifi_create_firewall_policy")
        );
    }

    #[test]
    fn test_with_name() {
        let server = server().with_name("lab");
        assert_eq!(server.config().name, "lab");
        assert!(server.registry().has_tool("health"));
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let err = server().dispatch("nope", json!({})).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("Unknown tool: nope"));
    }

    #[tokio::test]
    async fn test_dispatch_bad_arguments() {
        let err = server()
            .dispatch("unifi_get_device_details", json!({"mac": 7}))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_dispatch_health() {
        let result = server().dispatch("health", Value::Null).await.unwrap();
        assert_eq!(result_json(&result)["status"], "healthy");
    }
}
