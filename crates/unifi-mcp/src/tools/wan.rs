//! Read-only WAN tools.
//!
//! Nothing here changes uplink configuration; a bad WAN change cuts off
//! the controller this server talks to.

use rmcp::model::Tool;
use serde_json::Value;
use unifi_core::{Action, ToolResponse};

use crate::registry::{ToolRegistry, ToolResult};
use crate::tools::common::{NoArgs, ToolContext, handle, make_tool, ok_fields};

const CATEGORY: &str = "wan";

/// WAN status tools.
#[derive(Clone)]
pub struct WanTools {
    ctx: ToolContext,
}

impl WanTools {
    /// Tools over `ctx`.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn wan_status(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let config = self.ctx.managers.wan.get_wan_configuration().await?;
                Ok(ok_fields(&config))
            })
            .await
    }

    async fn failover_status(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let settings = self.ctx.managers.wan.get_wan_failover_settings().await?;
                Ok(ok_fields(&settings))
            })
            .await
    }

    async fn dream_machine_status(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let status = self.ctx.managers.wan.get_dream_machine_wan_status().await?;
                Ok(ok_fields(&status))
            })
            .await
    }

    async fn connectivity(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let report = self.ctx.managers.wan.check_wan_connectivity().await?;
                Ok(ok_fields(&report))
            })
            .await
    }
}

impl ToolRegistry for WanTools {
    fn tools(&self) -> Vec<Tool> {
        vec![
            make_tool::<NoArgs>(
                "unifi_get_wan_status",
                "Get WAN configuration and uplink status (read-only)",
            ),
            make_tool::<NoArgs>(
                "unifi_get_wan_failover_status",
                "Get WAN failover and load balancing settings (read-only)",
            ),
            make_tool::<NoArgs>(
                "unifi_get_dream_machine_wan_status",
                "Get WAN status on controllers that run on the gateway itself, such as the Dream Machine (read-only)",
            ),
            make_tool::<NoArgs>(
                "unifi_check_wan_connectivity",
                "Summarize which WAN uplinks are configured and active (read-only)",
            ),
        ]
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        let tools = self.clone();
        match name {
            "unifi_get_wan_status" => Some(handle(args, move |_: NoArgs| async move {
                tools.wan_status().await
            })),
            "unifi_get_wan_failover_status" => Some(handle(args, move |_: NoArgs| async move {
                tools.failover_status().await
            })),
            "unifi_get_dream_machine_wan_status" => {
                Some(handle(args, move |_: NoArgs| async move {
                    tools.dream_machine_status().await
                }))
            }
            "unifi_check_wan_connectivity" => Some(handle(args, move |_: NoArgs| async move {
                tools.connectivity().await
            })),
            _ => None,
        }
    }
}
