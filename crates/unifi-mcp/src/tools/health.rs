//! `health`: server status without touching the controller.

use rmcp::model::{CallToolResult, ErrorData, Tool};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unifi_core::ToolResponse;

use crate::registry::{ToolRegistry, ToolResult};
use crate::tools::common::{NoArgs, make_tool, ok_fields, respond};

/// Health check response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `healthy` while the server answers.
    pub status: String,
    /// Server name.
    pub server_name: String,
    /// Server version.
    pub version: String,
    /// Number of registered tools, `health` included.
    pub tool_count: usize,
    /// Controller site the tools operate on.
    pub site: String,
}

/// Provides the `health` tool.
pub struct HealthTools {
    response: HealthResponse,
}

impl HealthTools {
    /// Capture server metadata. `total_tool_count` includes `health`.
    pub fn new(
        server_name: impl Into<String>,
        version: impl Into<String>,
        site: impl Into<String>,
        total_tool_count: usize,
    ) -> Self {
        Self {
            response: HealthResponse {
                status: "healthy".to_string(),
                server_name: server_name.into(),
                version: version.into(),
                tool_count: total_tool_count,
                site: site.into(),
            },
        }
    }
}

impl ToolRegistry for HealthTools {
    fn tools(&self) -> Vec<Tool> {
        vec![make_tool::<NoArgs>(
            "health",
            "Check MCP server health. Does not contact the controller.",
        )]
    }

    fn call(&self, name: &str, _args: Value) -> Option<ToolResult> {
        if name != "health" {
            return None;
        }
        let response = self.response.clone();
        Some(Box::pin(async move { handle_health(&response) }))
    }
}

/// Render a health response without a registry.
pub fn handle_health(response: &HealthResponse) -> Result<CallToolResult, ErrorData> {
    let envelope: ToolResponse = ok_fields(response);
    respond(envelope)
}
