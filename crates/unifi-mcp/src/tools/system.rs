//! Site health and controller information.

use rmcp::model::Tool;
use serde_json::Value;
use unifi_core::{Action, ToolResponse};

use crate::registry::{ToolRegistry, ToolResult};
use crate::tools::common::{NoArgs, ToolContext, handle, make_tool};

const CATEGORY: &str = "system";

fn status_of(subsystem: &Value) -> &str {
    subsystem
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
}

/// System tools.
#[derive(Clone)]
pub struct SystemTools {
    ctx: ToolContext,
}

impl SystemTools {
    /// Tools over `ctx`.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn network_health(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let subsystems = self.ctx.managers.system.health().await?;
                let degraded: Vec<Value> = subsystems
                    .iter()
                    .filter(|s| status_of(s) != "ok")
                    .filter_map(|s| s.get("subsystem").cloned())
                    .collect();
                Ok(ToolResponse::ok()
                    .with("site", self.ctx.managers.site())
                    .with("count", subsystems.len())
                    .with("degraded", degraded)
                    .with("subsystems", subsystems))
            })
            .await
    }

    async fn system_info(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let info = self.ctx.managers.system.sysinfo().await?;
                let field = |key: &str| info.get(key).cloned().unwrap_or(Value::Null);
                Ok(ToolResponse::ok()
                    .with("version", field("version"))
                    .with("hostname", field("hostname"))
                    .with("timezone", field("timezone"))
                    .with("sysinfo", info))
            })
            .await
    }
}

impl ToolRegistry for SystemTools {
    fn tools(&self) -> Vec<Tool> {
        vec![
            make_tool::<NoArgs>(
                "unifi_get_network_health",
                "Get per-subsystem health (WAN, LAN, WLAN, WWW, VPN) for the site",
            ),
            make_tool::<NoArgs>(
                "unifi_get_system_info",
                "Get controller version, hostname and other system information",
            ),
        ]
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        let tools = self.clone();
        match name {
            "unifi_get_network_health" => Some(handle(args, move |_: NoArgs| async move {
                tools.network_health().await
            })),
            "unifi_get_system_info" => Some(handle(args, move |_: NoArgs| async move {
                tools.system_info().await
            })),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tools::common::{result_json, test_context};
    use serde_json::json;
    use std::sync::Arc;
    use unifi_client::MockController;

    #[tokio::test]
    async fn test_network_health_lists_degraded() {
        let mock = MockController::new();
        mock.respond_get(
            "/stat/health",
            json!([
                {"subsystem": "wan", "status": "ok"},
                {"subsystem": "wlan", "status": "warning"},
                {"subsystem": "vpn"}
            ]),
        );
        let mock = Arc::new(mock);
        let tools = SystemTools::new(test_context(&mock));
        let body = result_json(
            &tools
                .call("unifi_get_network_health", json!({}))
                .unwrap()
                .await
                .unwrap(),
        );
        assert_eq!(body["count"], 3);
        assert_eq!(body["degraded"], json!(["wlan", "vpn"]));
    }

    #[tokio::test]
    async fn test_system_info() {
        let mock = MockController::new();
        mock.respond_get(
            "/stat/sysinfo",
            json!([{"version": "8.0.7", "hostname": "unifi", "timezone": "UTC"}]),
        );
        let mock = Arc::new(mock);
        let tools = SystemTools::new(test_context(&mock));
        let body = result_json(
            &tools
                .call("unifi_get_system_info", json!({}))
                .unwrap()
                .await
                .unwrap(),
        );
        assert_eq!(body["version"], "8.0.7");
        assert_eq!(body["sysinfo"]["hostname"], "unifi");
    }

    #[tokio::test]
    async fn test_system_info_missing() {
        let mock = MockController::new();
        mock.respond_get("/stat/sysinfo", json!([]));
        let mock = Arc::new(mock);
        let tools = SystemTools::new(test_context(&mock));
        let result = tools
            .call("unifi_get_system_info", json!({}))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result_json(&result)["success"], false);
    }
}
