//! Switch port tools.
//!
//! Ports are addressed by their 0-based `port_idx`; messages use the
//! 1-based port number printed on the switch.

use std::str::FromStr;

use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use unifi_core::{Action, PoeMode, ToolResponse};
use unifi_network::port_number;

use crate::registry::{ToolRegistry, ToolResult};
use crate::tools::common::{
    NoArgs, ToolContext, check_mac, handle, make_tool, ok_fields, require_confirm,
};

const CATEGORY: &str = "devices";

/// `{"device_mac": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SwitchArgs {
    /// MAC address of the switch.
    pub device_mac: String,
}

/// Enable or disable one port.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TogglePortArgs {
    /// MAC address of the switch.
    pub device_mac: String,
    /// Port index, 0-based (port 1 is index 0).
    pub port_idx: u32,
    /// True to enable, false to disable.
    pub enabled: bool,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// Set the PoE mode of one port.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PoeArgs {
    /// MAC address of the switch.
    pub device_mac: String,
    /// Port index, 0-based.
    pub port_idx: u32,
    /// One of `auto`, `passive`, `passthrough`, `off`.
    pub poe_mode: String,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// Assign a port profile to one port.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PortProfileArgs {
    /// MAC address of the switch.
    pub device_mac: String,
    /// Port index, 0-based.
    pub port_idx: u32,
    /// Port profile id, see `unifi_list_port_profiles`.
    pub portconf_id: String,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// Rename one port.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PortNameArgs {
    /// MAC address of the switch.
    pub device_mac: String,
    /// Port index, 0-based.
    pub port_idx: u32,
    /// New port name.
    pub name: String,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// Power-cycle one PoE port.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PortArgs {
    /// MAC address of the switch.
    pub device_mac: String,
    /// Port index, 0-based.
    pub port_idx: u32,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

fn port_response(mac: &str, port_idx: u32) -> ToolResponse {
    ToolResponse::ok()
        .with("device_mac", mac)
        .with("port_idx", port_idx)
        .with("port_number", port_number(port_idx))
}

/// Switch port tools.
#[derive(Clone)]
pub struct SwitchPortTools {
    ctx: ToolContext,
}

impl SwitchPortTools {
    /// Tools over `ctx`.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn list_switch_ports(&self, args: SwitchArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                if let Some(invalid) = check_mac(&args.device_mac) {
                    return Ok(invalid);
                }
                let ports = self
                    .ctx
                    .managers
                    .devices
                    .list_switch_ports(&args.device_mac)
                    .await?;
                Ok(ok_fields(&ports))
            })
            .await
    }

    async fn toggle_switch_port(&self, args: TogglePortArgs) -> ToolResponse {
        let TogglePortArgs {
            device_mac,
            port_idx,
            enabled,
            confirm,
        } = args;
        self.ctx
            .run(CATEGORY, Action::Update, async {
                if let Some(invalid) = check_mac(&device_mac) {
                    return Ok(invalid);
                }
                let verb = if enabled { "enable" } else { "disable" };
                let warning = format!(
                    "This will {verb} port {} on switch {device_mac}",
                    port_number(port_idx)
                );
                let preview = json!({ "device_mac": device_mac, "port_idx": port_idx, "enabled": enabled });
                if let Some(pending) = require_confirm(confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                self.ctx
                    .managers
                    .devices
                    .toggle_switch_port(&device_mac, port_idx, enabled)
                    .await?;
                let state = if enabled { "enabled" } else { "disabled" };
                Ok(port_response(&device_mac, port_idx)
                    .with("enabled", enabled)
                    .with("message", format!("Port {} has been {state}", port_number(port_idx))))
            })
            .await
    }

    async fn set_port_poe(&self, args: PoeArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                if let Some(invalid) = check_mac(&args.device_mac) {
                    return Ok(invalid);
                }
                let Ok(mode) = PoeMode::from_str(&args.poe_mode) else {
                    let modes: Vec<&str> = PoeMode::ALL.iter().map(PoeMode::as_str).collect();
                    return Ok(ToolResponse::failure(format!(
                        "Invalid PoE mode. Must be one of: {}",
                        modes.join(", ")
                    )));
                };
                let port = port_number(args.port_idx);
                let warning = format!(
                    "This will set PoE mode to '{mode}' for port {port} on switch {}",
                    args.device_mac
                );
                let preview = json!({
                    "device_mac": args.device_mac,
                    "port_idx": args.port_idx,
                    "poe_mode": mode.as_str(),
                });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                self.ctx
                    .managers
                    .devices
                    .set_port_poe_mode(&args.device_mac, args.port_idx, mode)
                    .await?;
                Ok(port_response(&args.device_mac, args.port_idx)
                    .with("poe_mode", mode.as_str())
                    .with("message", format!("PoE mode set to '{mode}' for port {port}")))
            })
            .await
    }

    async fn set_port_profile(&self, args: PortProfileArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                if let Some(invalid) = check_mac(&args.device_mac) {
                    return Ok(invalid);
                }
                let port = port_number(args.port_idx);
                let warning = format!(
                    "This will change the port profile for port {port} on switch {}",
                    args.device_mac
                );
                let preview = json!({
                    "device_mac": args.device_mac,
                    "port_idx": args.port_idx,
                    "portconf_id": args.portconf_id,
                });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                self.ctx
                    .managers
                    .devices
                    .set_port_profile(&args.device_mac, args.port_idx, &args.portconf_id)
                    .await?;
                Ok(port_response(&args.device_mac, args.port_idx)
                    .with("portconf_id", args.portconf_id.as_str())
                    .with("message", format!("Port profile updated for port {port}")))
            })
            .await
    }

    async fn set_port_name(&self, args: PortNameArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                if let Some(invalid) = check_mac(&args.device_mac) {
                    return Ok(invalid);
                }
                let port = port_number(args.port_idx);
                let warning = format!(
                    "This will rename port {port} to '{}' on switch {}",
                    args.name, args.device_mac
                );
                let preview = json!({
                    "device_mac": args.device_mac,
                    "port_idx": args.port_idx,
                    "name": args.name,
                });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                self.ctx
                    .managers
                    .devices
                    .set_port_name(&args.device_mac, args.port_idx, &args.name)
                    .await?;
                Ok(port_response(&args.device_mac, args.port_idx)
                    .with("name", args.name.as_str())
                    .with("message", format!("Port {port} renamed to '{}'", args.name)))
            })
            .await
    }

    async fn list_port_profiles(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let profiles = self.ctx.managers.devices.port_profiles().await?;
                Ok(ToolResponse::ok()
                    .with("count", profiles.len())
                    .with_serialized("profiles", &profiles))
            })
            .await
    }

    async fn restart_poe_port(&self, args: PortArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                if let Some(invalid) = check_mac(&args.device_mac) {
                    return Ok(invalid);
                }
                let port = port_number(args.port_idx);
                let warning = format!(
                    "This will power cycle port {port} on switch {}, temporarily disconnecting any connected device",
                    args.device_mac
                );
                let preview = json!({
                    "device_mac": args.device_mac,
                    "port_idx": args.port_idx,
                    "delay_secs": self.ctx.settings.poe_cycle_delay_secs,
                });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                self.ctx
                    .managers
                    .devices
                    .restart_poe_port(
                        &args.device_mac,
                        args.port_idx,
                        self.ctx.settings.poe_cycle_delay(),
                    )
                    .await?;
                Ok(port_response(&args.device_mac, args.port_idx).with(
                    "message",
                    format!("PoE power cycled for port {port}. Device should be restarting."),
                ))
            })
            .await
    }
}

impl ToolRegistry for SwitchPortTools {
    fn tools(&self) -> Vec<Tool> {
        vec![
            make_tool::<SwitchArgs>(
                "unifi_list_switch_ports",
                "List all ports and their configurations for a specific switch",
            ),
            make_tool::<TogglePortArgs>(
                "unifi_toggle_switch_port",
                "Enable or disable a specific port on a switch. Requires confirm=true",
            ),
            make_tool::<PoeArgs>(
                "unifi_set_port_poe",
                "Set PoE mode for a specific switch port. Requires confirm=true",
            ),
            make_tool::<PortProfileArgs>(
                "unifi_set_port_profile",
                "Set port profile for a specific switch port. Requires confirm=true",
            ),
            make_tool::<PortNameArgs>(
                "unifi_set_port_name",
                "Set custom name for a specific switch port. Requires confirm=true",
            ),
            make_tool::<NoArgs>(
                "unifi_list_port_profiles",
                "List all available port profiles",
            ),
            make_tool::<PortArgs>(
                "unifi_restart_poe_port",
                "Power cycle a PoE port to restart the connected device. Requires confirm=true",
            ),
        ]
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        let tools = self.clone();
        match name {
            "unifi_list_switch_ports" => Some(handle(args, move |a: SwitchArgs| async move {
                tools.list_switch_ports(a).await
            })),
            "unifi_toggle_switch_port" => Some(handle(args, move |a: TogglePortArgs| async move {
                tools.toggle_switch_port(a).await
            })),
            "unifi_set_port_poe" => Some(handle(args, move |a: PoeArgs| async move {
                tools.set_port_poe(a).await
            })),
            "unifi_set_port_profile" => Some(handle(args, move |a: PortProfileArgs| async move {
                tools.set_port_profile(a).await
            })),
            "unifi_set_port_name" => Some(handle(args, move |a: PortNameArgs| async move {
                tools.set_port_name(a).await
            })),
            "unifi_list_port_profiles" => Some(handle(args, move |_: NoArgs| async move {
                tools.list_port_profiles().await
            })),
            "unifi_restart_poe_port" => Some(handle(args, move |a: PortArgs| async move {
                tools.restart_poe_port(a).await
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
    use std::sync::Arc;
    use unifi_client::{HttpMethod, MockController};

    const SWITCH: &str = "aa:bb:cc:00:00:01";

    fn mock() -> Arc<MockController> {
        let mock = MockController::new().accept_writes();
        mock.respond_get(
            "/stat/device",
            json!([
                {
                    "_id": "sw1",
                    "mac": SWITCH,
                    "type": "usw",
                    "model": "USL16LP",
                    "name": "Office",
                    "port_table": [
                        {"port_idx": 0, "up": true, "speed": 1000, "poe_mode": "auto"},
                        {"port_idx": 1}
                    ],
                    "port_overrides": [
                        {"port_idx": 1, "name": "Camera", "forward": "disabled"}
                    ]
                },
                {"_id": "ap1", "mac": "aa:bb:cc:00:00:02", "type": "uap"}
            ]),
        );
        mock.respond_get(
            "/rest/portconf",
            json!([{"_id": "p1", "name": "All"}, {"_id": "p2", "name": "Cameras", "isolation": true}]),
        );
        Arc::new(mock)
    }

    async fn call(tools: &SwitchPortTools, name: &str, args: Value) -> Value {
        result_json(&tools.call(name, args).unwrap().await.unwrap())
    }

    #[tokio::test]
    async fn test_list_switch_ports() {
        let mock = mock();
        let tools = SwitchPortTools::new(test_context(&mock));
        let body = call(&tools, "unifi_list_switch_ports", json!({"device_mac": SWITCH})).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["port_count"], 2);
        assert_eq!(body["ports"][0]["name"], "Port 1");
        assert_eq!(body["ports"][0]["poe_mode"], "auto");
        assert_eq!(body["ports"][1]["name"], "Camera");
        assert_eq!(body["ports"][1]["enabled"], false);
    }

    #[tokio::test]
    async fn test_list_ports_of_non_switch() {
        let mock = mock();
        let tools = SwitchPortTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_list_switch_ports",
            json!({"device_mac": "aa:bb:cc:00:00:02"}),
        )
        .await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Device aa:bb:cc:00:00:02 is not a switch");
    }

    #[tokio::test]
    async fn test_toggle_preview_names_port_number() {
        let mock = mock();
        let tools = SwitchPortTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_toggle_switch_port",
            json!({"device_mac": SWITCH, "port_idx": 3, "enabled": false}),
        )
        .await;
        assert_eq!(body["warning"], format!("This will disable port 4 on switch {SWITCH}"));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_toggle_confirmed() {
        let mock = mock();
        let tools = SwitchPortTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_toggle_switch_port",
            json!({"device_mac": SWITCH, "port_idx": 1, "enabled": true, "confirm": true}),
        )
        .await;
        assert_eq!(body["success"], true);
        assert_eq!(body["port_number"], 2);
        assert_eq!(body["message"], "Port 2 has been enabled");

        let put = mock.last_request().unwrap();
        assert_eq!(put.method, HttpMethod::Put);
        assert_eq!(put.path, "/rest/device/sw1");
        let overrides = &put.data.unwrap()["port_overrides"];
        assert_eq!(overrides[0]["name"], "Camera");
        assert!(overrides[0].get("forward").is_none());
    }

    #[tokio::test]
    async fn test_largest_port_index_does_not_overflow() {
        let mock = mock();
        let tools = SwitchPortTools::new(test_context(&mock));
        let args = json!({"device_mac": SWITCH, "port_idx": u32::MAX, "poe_mode": "off"});
        let body = call(&tools, "unifi_set_port_poe", args.clone()).await;
        assert_eq!(
            body["warning"],
            format!("This will set PoE mode to 'off' for port {} on switch {SWITCH}", u32::MAX)
        );

        let mut confirmed = args;
        confirmed["confirm"] = json!(true);
        let body = call(&tools, "unifi_set_port_poe", confirmed).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], format!("Port not found: {}", u32::MAX));
        assert!(mock.mutating_requests().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_rejects_non_switch() {
        let mock = mock();
        let tools = SwitchPortTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_toggle_switch_port",
            json!({"device_mac": "aa:bb:cc:00:00:02", "port_idx": 40, "enabled": false, "confirm": true}),
        )
        .await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Device aa:bb:cc:00:00:02 is not a switch");
        assert!(mock.mutating_requests().is_empty());
    }

    #[tokio::test]
    async fn test_rename_missing_port() {
        let mock = mock();
        let tools = SwitchPortTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_set_port_name",
            json!({"device_mac": SWITCH, "port_idx": 7, "name": "Spare", "confirm": true}),
        )
        .await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Port not found: 8");
        assert!(mock.mutating_requests().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_poe_mode() {
        let mock = mock();
        let tools = SwitchPortTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_set_port_poe",
            json!({"device_mac": SWITCH, "port_idx": 0, "poe_mode": "turbo", "confirm": true}),
        )
        .await;
        assert_eq!(
            body["error"],
            "Invalid PoE mode. Must be one of: auto, passive, passthrough, off"
        );
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_set_poe_confirmed() {
        let mock = mock();
        let tools = SwitchPortTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_set_port_poe",
            json!({"device_mac": SWITCH, "port_idx": 0, "poe_mode": "off", "confirm": true}),
        )
        .await;
        assert_eq!(body["message"], "PoE mode set to 'off' for port 1");
        let data = mock.last_request().unwrap().data.unwrap();
        let port0 = data["port_overrides"]
            .as_array()
            .unwrap()
            .iter()
            .find(|o| o["port_idx"] == 0)
            .unwrap()
            .clone();
        assert_eq!(port0["poe_mode"], "off");
    }

    #[tokio::test]
    async fn test_rename_port_preview() {
        let mock = mock();
        let tools = SwitchPortTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_set_port_name",
            json!({"device_mac": SWITCH, "port_idx": 0, "name": "Uplink"}),
        )
        .await;
        assert_eq!(
            body["warning"],
            format!("This will rename port 1 to 'Uplink' on switch {SWITCH}")
        );
        assert_eq!(body["preview"]["name"], "Uplink");
    }

    #[tokio::test]
    async fn test_list_port_profiles() {
        let mock = mock();
        let tools = SwitchPortTools::new(test_context(&mock));
        let body = call(&tools, "unifi_list_port_profiles", json!({})).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["profiles"][1]["name"], "Cameras");
        assert_eq!(body["profiles"][1]["isolation"], true);
    }

    #[tokio::test]
    async fn test_restart_poe_cycles_off_then_auto() {
        let mock = mock();
        let tools = SwitchPortTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_restart_poe_port",
            json!({"device_mac": SWITCH, "port_idx": 0, "confirm": true}),
        )
        .await;
        assert_eq!(
            body["message"],
            "PoE power cycled for port 1. Device should be restarting."
        );
        let puts = mock.mutating_requests();
        assert_eq!(puts.len(), 2);
        let mode = |i: usize| {
            puts[i].data.as_ref().unwrap()["port_overrides"]
                .as_array()
                .unwrap()
                .iter()
                .find(|o| o["port_idx"] == 0)
                .unwrap()["poe_mode"]
                .clone()
        };
        assert_eq!(mode(0), "off");
        assert_eq!(mode(1), "auto");
    }
}
