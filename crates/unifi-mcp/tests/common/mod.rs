//! Common test harness: the full registry over a mock controller.

use std::sync::Arc;
use std::time::Duration;

use rmcp::model::CallToolResult;
use serde_json::{Value, json};
use unifi_client::{Connection, MockController};
use unifi_core::Permissions;
use unifi_mcp::{CompositeRegistry, ToolContext, ToolRegistry, ToolSettings, build_registry};
use unifi_network::Managers;

pub const SWITCH_MAC: &str = "aa:bb:cc:00:00:01";
pub const CLIENT_MAC: &str = "11:22:33:44:55:66";

/// Registry plus the mock it talks to.
pub struct TestHarness {
    /// Mock controller. Inspect its request log in assertions.
    pub mock: Arc<MockController>,
    /// Every tool the server exposes.
    pub registry: CompositeRegistry,
}

impl TestHarness {
    /// Harness that allows every action.
    pub fn new() -> Self {
        Self::with_permissions(Permissions::allow_all())
    }

    /// Harness with a specific permission table.
    pub fn with_permissions(permissions: Permissions) -> Self {
        let mock = Arc::new(seeded_mock());
        let conn = Connection::new(mock.clone(), Duration::from_secs(60));
        let ctx = ToolContext::new(
            Managers::new(Arc::new(conn)),
            permissions,
            ToolSettings {
                poe_cycle_delay_secs: 0,
            },
        );
        Self {
            mock,
            registry: build_registry(ctx, "unifi-mcp", "0.3.0"),
        }
    }

    /// Call a tool and return the raw result.
    pub async fn call_result(&self, name: &str, args: Value) -> CallToolResult {
        self.registry
            .call(name, args)
            .unwrap_or_else(|| panic!("tool {name} is not registered"))
            .await
            .unwrap_or_else(|e| panic!("tool {name} returned a protocol error: {e:?}"))
    }

    /// Call a tool and return its JSON envelope.
    pub async fn call(&self, name: &str, args: Value) -> Value {
        envelope(&self.call_result(name, args).await)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// The JSON envelope inside a tool result.
pub fn envelope(result: &CallToolResult) -> Value {
    let text = result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.clone())
        .expect("tool result has text content");
    serde_json::from_str(&text).expect("tool result is JSON")
}

fn seeded_mock() -> MockController {
    let mock = MockController::new().accept_writes();
    mock.respond_get(
        "/stat/device",
        json!([{
            "_id": "d1",
            "mac": SWITCH_MAC,
            "type": "usw",
            "model": "USW-24-PoE",
            "name": "Core switch",
            "port_table": [
                {"port_idx": 0, "name": "Port 1", "up": true, "poe_mode": "auto"},
                {"port_idx": 1, "name": "Port 2", "up": false}
            ],
            "port_overrides": [{"port_idx": 0, "name": "Uplink"}]
        }]),
    );
    mock.respond_get(
        "/stat/sta",
        json!([{"mac": CLIENT_MAC, "hostname": "laptop", "ip": "10.0.0.50"}]),
    );
    mock.respond_get(
        "/rest/user",
        json!([{"_id": "u1", "mac": CLIENT_MAC, "name": "Laptop"}]),
    );
    mock.respond_get(
        "/rest/networkconf",
        json!([{
            "_id": "n1",
            "name": "LAN",
            "purpose": "corporate",
            "ip_subnet": "10.0.0.1/24",
            "dhcpd_start": "10.0.0.100",
            "dhcpd_stop": "10.0.0.200"
        }]),
    );
    mock.respond_get(
        "/rest/wlanconf",
        json!([{"_id": "w1", "name": "Home", "enabled": true, "x_passphrase": "secretpass"}]),
    );
    mock.respond_get(
        "/firewall-policies",
        json!([{"_id": "p1", "name": "Block IoT", "enabled": true, "action": "BLOCK"}]),
    );
    mock.respond_get(
        "/trafficroutes",
        json!([{"_id": "r1", "description": "VPN", "enabled": true}]),
    );
    mock
}
