//! Fixed IP reservation tools.

use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use unifi_core::{Action, ToolResponse, validate_ip_address};

use crate::registry::{ToolRegistry, ToolResult};
use crate::tools::common::{NoArgs, ToolContext, check_mac, handle, make_tool, require_confirm};

const CATEGORY: &str = "dhcp";

/// Assign a fixed IP to a known client.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetFixedIpArgs {
    /// Client MAC, e.g. `aa:bb:cc:dd:ee:ff`.
    pub mac_address: String,
    /// Address to reserve, e.g. `192.168.1.100`.
    pub fixed_ip: String,
    /// Network id. Detected from the subnet containing `fixed_ip` when absent.
    #[serde(default)]
    pub network_id: Option<String>,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// Return a client to dynamic addressing.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveFixedIpArgs {
    /// Client MAC.
    pub mac_address: String,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// `{"mac_address": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClientMacArgs {
    /// Client MAC.
    pub mac_address: String,
}

/// Reserve an address for a device that may never have connected.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateReservationArgs {
    /// Device MAC.
    pub mac_address: String,
    /// Address to reserve.
    pub fixed_ip: String,
    /// Optional device name.
    #[serde(default)]
    pub name: Option<String>,
    /// Network id. Detected from the subnet containing `fixed_ip` when absent.
    #[serde(default)]
    pub network_id: Option<String>,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// `{"network_id": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct NetworkIdArgs {
    /// Network id, see `unifi_list_networks`.
    pub network_id: String,
}

fn check_ip(ip: &str) -> Option<ToolResponse> {
    (!validate_ip_address(ip)).then(|| ToolResponse::failure("Invalid IP address format"))
}

/// DHCP reservation tools.
#[derive(Clone)]
pub struct DhcpTools {
    ctx: ToolContext,
}

impl DhcpTools {
    /// Tools over `ctx`.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn list_reservations(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let reservations = self.ctx.managers.dhcp.list_dhcp_reservations().await?;
                Ok(ToolResponse::ok()
                    .with("count", reservations.len())
                    .with_serialized("reservations", &reservations))
            })
            .await
    }

    async fn set_fixed_ip(&self, args: SetFixedIpArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                if let Some(invalid) = check_mac(&args.mac_address).or_else(|| check_ip(&args.fixed_ip))
                {
                    return Ok(invalid);
                }
                let warning = format!(
                    "This will reserve {} for client {}",
                    args.fixed_ip, args.mac_address
                );
                let preview = json!({
                    "mac_address": args.mac_address,
                    "fixed_ip": args.fixed_ip,
                    "network_id": args.network_id,
                });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                self.ctx
                    .managers
                    .dhcp
                    .set_client_fixed_ip(&args.mac_address, &args.fixed_ip, args.network_id.as_deref())
                    .await?;
                Ok(ToolResponse::ok()
                    .with(
                        "message",
                        format!("Fixed IP {} assigned to {}", args.fixed_ip, args.mac_address),
                    )
                    .with("mac_address", args.mac_address.as_str())
                    .with("fixed_ip", args.fixed_ip.as_str())
                    .with("network_id", args.network_id.clone()))
            })
            .await
    }

    async fn remove_fixed_ip(&self, args: RemoveFixedIpArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                if let Some(invalid) = check_mac(&args.mac_address) {
                    return Ok(invalid);
                }
                let warning = format!(
                    "This will remove the fixed IP of client {} and return it to DHCP",
                    args.mac_address
                );
                let preview = json!({ "mac_address": args.mac_address, "use_fixedip": false });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                self.ctx
                    .managers
                    .dhcp
                    .remove_client_fixed_ip(&args.mac_address)
                    .await?;
                Ok(ToolResponse::ok()
                    .with(
                        "message",
                        format!("Fixed IP removed for {}, DHCP enabled", args.mac_address),
                    )
                    .with("mac_address", args.mac_address.as_str()))
            })
            .await
    }

    async fn get_fixed_ip(&self, args: ClientMacArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                if let Some(invalid) = check_mac(&args.mac_address) {
                    return Ok(invalid);
                }
                let found = self
                    .ctx
                    .managers
                    .dhcp
                    .get_client_fixed_ip(&args.mac_address)
                    .await?;
                Ok(match found {
                    Some(Value::Object(fields)) => fields
                        .into_iter()
                        .fold(ToolResponse::ok(), |r, (k, v)| r.with(&k, v)),
                    _ => ToolResponse::failure(format!(
                        "No fixed IP configuration found for {}",
                        args.mac_address
                    )),
                })
            })
            .await
    }

    async fn create_reservation(&self, args: CreateReservationArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Create, async {
                if let Some(invalid) = check_mac(&args.mac_address).or_else(|| check_ip(&args.fixed_ip))
                {
                    return Ok(invalid);
                }
                let warning = format!(
                    "This will create a DHCP reservation of {} for {}",
                    args.fixed_ip, args.mac_address
                );
                let preview = json!({
                    "mac_address": args.mac_address,
                    "fixed_ip": args.fixed_ip,
                    "name": args.name,
                    "network_id": args.network_id,
                });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                self.ctx
                    .managers
                    .dhcp
                    .create_dhcp_reservation(
                        &args.mac_address,
                        &args.fixed_ip,
                        args.name.as_deref(),
                        args.network_id.as_deref(),
                    )
                    .await?;
                let mut response = ToolResponse::ok()
                    .with(
                        "message",
                        format!("DHCP reservation created for {}", args.mac_address),
                    )
                    .with("mac_address", args.mac_address.as_str())
                    .with("fixed_ip", args.fixed_ip.as_str());
                if let Some(name) = &args.name {
                    response = response.with("name", name.as_str());
                }
                if let Some(network_id) = &args.network_id {
                    response = response.with("network_id", network_id.as_str());
                }
                Ok(response)
            })
            .await
    }

    async fn available_ips(&self, args: NetworkIdArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let ips = self
                    .ctx
                    .managers
                    .dhcp
                    .list_available_ips(&args.network_id)
                    .await?;
                Ok(ToolResponse::ok()
                    .with("network_id", args.network_id.as_str())
                    .with("count", ips.len())
                    .with("available_ips", ips))
            })
            .await
    }
}

impl ToolRegistry for DhcpTools {
    fn tools(&self) -> Vec<Tool> {
        vec![
            make_tool::<NoArgs>(
                "unifi_list_dhcp_reservations",
                "List all DHCP reservations (fixed IP assignments)",
            ),
            make_tool::<SetFixedIpArgs>(
                "unifi_set_client_fixed_ip",
                "Set or update a fixed IP reservation for a known client. Requires confirm=true",
            ),
            make_tool::<RemoveFixedIpArgs>(
                "unifi_remove_client_fixed_ip",
                "Remove a client's fixed IP reservation and enable DHCP. Requires confirm=true",
            ),
            make_tool::<ClientMacArgs>(
                "unifi_get_client_fixed_ip",
                "Get the fixed IP configuration of a client",
            ),
            make_tool::<CreateReservationArgs>(
                "unifi_create_dhcp_reservation",
                "Create a DHCP reservation for a device, even one that has never connected. Requires confirm=true",
            ),
            make_tool::<NetworkIdArgs>(
                "unifi_list_available_ips",
                "List up to 50 addresses in a network's DHCP pool that are neither reserved nor in use",
            ),
        ]
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        let tools = self.clone();
        match name {
            "unifi_list_dhcp_reservations" => Some(handle(args, move |_: NoArgs| async move {
                tools.list_reservations().await
            })),
            "unifi_set_client_fixed_ip" => Some(handle(args, move |a: SetFixedIpArgs| async move {
                tools.set_fixed_ip(a).await
            })),
            "unifi_remove_client_fixed_ip" => {
                Some(handle(args, move |a: RemoveFixedIpArgs| async move {
                    tools.remove_fixed_ip(a).await
                }))
            }
            "unifi_get_client_fixed_ip" => Some(handle(args, move |a: ClientMacArgs| async move {
                tools.get_fixed_ip(a).await
            })),
            "unifi_create_dhcp_reservation" => {
                Some(handle(args, move |a: CreateReservationArgs| async move {
                    tools.create_reservation(a).await
                }))
            }
            "unifi_list_available_ips" => Some(handle(args, move |a: NetworkIdArgs| async move {
                tools.available_ips(a).await
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

    const PRINTER: &str = "00:11:22:33:44:55";

    fn mock() -> Arc<MockController> {
        let mock = MockController::new().accept_writes();
        mock.respond_get(
            "/rest/networkconf",
            json!([
                {"_id": "wan1", "name": "WAN", "purpose": "wan"},
                {
                    "_id": "lan1",
                    "name": "LAN",
                    "purpose": "corporate",
                    "ip_subnet": "192.168.1.1/24",
                    "dhcpd_start": "192.168.1.100",
                    "dhcpd_stop": "192.168.1.105"
                }
            ]),
        );
        mock.respond_get(
            "/rest/user",
            json!([
                {"_id": "u1", "mac": PRINTER, "name": "Printer", "use_fixedip": true, "fixed_ip": "192.168.1.101", "network_id": "lan1"},
                {"_id": "u2", "mac": "00:11:22:33:44:66", "hostname": "tv"}
            ]),
        );
        mock.respond_get("/stat/sta", json!([{"mac": "00:11:22:33:44:66", "ip": "192.168.1.100"}]));
        Arc::new(mock)
    }

    async fn call(tools: &DhcpTools, name: &str, args: Value) -> Value {
        result_json(&tools.call(name, args).unwrap().await.unwrap())
    }

    #[tokio::test]
    async fn test_list_reservations() {
        let mock = mock();
        let tools = DhcpTools::new(test_context(&mock));
        let body = call(&tools, "unifi_list_dhcp_reservations", json!({})).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["reservations"][0]["network_name"], "LAN");
        assert_eq!(body["reservations"][0]["network_subnet"], "192.168.1.1/24");
    }

    #[tokio::test]
    async fn test_set_fixed_ip_validates_first() {
        let mock = mock();
        let tools = DhcpTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_set_client_fixed_ip",
            json!({"mac_address": "xx", "fixed_ip": "192.168.1.10"}),
        )
        .await;
        assert_eq!(body["error"], "Invalid MAC address format");
        let body = call(
            &tools,
            "unifi_set_client_fixed_ip",
            json!({"mac_address": PRINTER, "fixed_ip": "999.1.1.1"}),
        )
        .await;
        assert_eq!(body["error"], "Invalid IP address format");
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_set_fixed_ip_preview_sends_nothing() {
        let mock = mock();
        let tools = DhcpTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_set_client_fixed_ip",
            json!({"mac_address": "00:11:22:33:44:66", "fixed_ip": "192.168.1.50"}),
        )
        .await;
        assert_eq!(body["error"], unifi_core::CONFIRMATION_REQUIRED);
        assert_eq!(body["preview"]["fixed_ip"], "192.168.1.50");
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_set_fixed_ip_detects_network() {
        let mock = mock();
        let tools = DhcpTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_set_client_fixed_ip",
            json!({"mac_address": "00:11:22:33:44:66", "fixed_ip": "192.168.1.50", "confirm": true}),
        )
        .await;
        assert_eq!(body["message"], "Fixed IP 192.168.1.50 assigned to 00:11:22:33:44:66");
        let put = mock.last_request().unwrap();
        assert_eq!(put.method, HttpMethod::Put);
        assert_eq!(put.path, "/rest/user/u2");
        assert_eq!(put.data.unwrap()["network_id"], "lan1");
    }

    #[tokio::test]
    async fn test_set_fixed_ip_outside_every_subnet() {
        let mock = mock();
        let tools = DhcpTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_set_client_fixed_ip",
            json!({"mac_address": PRINTER, "fixed_ip": "10.9.9.9", "confirm": true}),
        )
        .await;
        assert_eq!(body["success"], false);
        assert!(mock.mutating_requests().is_empty());
    }

    #[tokio::test]
    async fn test_get_fixed_ip() {
        let mock = mock();
        let tools = DhcpTools::new(test_context(&mock));
        let body = call(&tools, "unifi_get_client_fixed_ip", json!({"mac_address": PRINTER})).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["fixed_ip"], "192.168.1.101");

        let body = call(
            &tools,
            "unifi_get_client_fixed_ip",
            json!({"mac_address": "00:11:22:33:44:66"}),
        )
        .await;
        assert_eq!(
            body["error"],
            "No fixed IP configuration found for 00:11:22:33:44:66"
        );
    }

    #[tokio::test]
    async fn test_remove_fixed_ip() {
        let mock = mock();
        let tools = DhcpTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_remove_client_fixed_ip",
            json!({"mac_address": PRINTER, "confirm": true}),
        )
        .await;
        assert_eq!(body["message"], format!("Fixed IP removed for {PRINTER}, DHCP enabled"));
        let data = mock.last_request().unwrap().data.unwrap();
        assert_eq!(data["use_fixedip"], false);
        assert!(data.get("fixed_ip").is_none());
    }

    #[tokio::test]
    async fn test_create_reservation() {
        let mock = mock();
        let tools = DhcpTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_create_dhcp_reservation",
            json!({"mac_address": "AA:BB:CC:DD:EE:FF", "fixed_ip": "192.168.1.60", "name": "NAS", "confirm": true}),
        )
        .await;
        assert_eq!(body["name"], "NAS");
        assert!(body.get("network_id").is_none());
        let post = mock.last_request().unwrap();
        assert_eq!(post.method, HttpMethod::Post);
        let data = post.data.unwrap();
        assert_eq!(data["mac"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(data["noted"], true);
    }

    #[tokio::test]
    async fn test_available_ips_skip_taken() {
        let mock = mock();
        let tools = DhcpTools::new(test_context(&mock));
        let body = call(&tools, "unifi_list_available_ips", json!({"network_id": "lan1"})).await;
        assert_eq!(
            body["available_ips"],
            json!(["192.168.1.102", "192.168.1.103", "192.168.1.104", "192.168.1.105"])
        );
        assert_eq!(body["count"], 4);
    }
}
