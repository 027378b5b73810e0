//! The registry exposes the full tool surface and agrees with the guide.

use std::collections::BTreeSet;

use serde_json::json;
use unifi_mcp::ToolRegistry;
use unifi_mcp::guide;

use crate::common::TestHarness;

const EXPECTED_TOOLS: &[&str] = &[
    "health",
    "unifi_tool_guide",
    "unifi_list_devices",
    "unifi_get_device_details",
    "unifi_reboot_device",
    "unifi_rename_device",
    "unifi_adopt_device",
    "unifi_upgrade_device",
    "unifi_list_switch_ports",
    "unifi_toggle_switch_port",
    "unifi_set_port_poe",
    "unifi_set_port_profile",
    "unifi_set_port_name",
    "unifi_list_port_profiles",
    "unifi_restart_poe_port",
    "unifi_list_clients",
    "unifi_list_known_clients",
    "unifi_get_client_details",
    "unifi_block_client",
    "unifi_unblock_client",
    "unifi_reconnect_client",
    "unifi_rename_client",
    "unifi_list_dhcp_reservations",
    "unifi_set_client_fixed_ip",
    "unifi_remove_client_fixed_ip",
    "unifi_get_client_fixed_ip",
    "unifi_create_dhcp_reservation",
    "unifi_list_available_ips",
    "unifi_list_networks",
    "unifi_get_network_details",
    "unifi_create_network",
    "unifi_update_network",
    "unifi_delete_network",
    "unifi_list_wlans",
    "unifi_get_wlan_details",
    "unifi_create_wlan",
    "unifi_update_wlan",
    "unifi_toggle_wlan",
    "unifi_delete_wlan",
    "unifi_get_wan_status",
    "unifi_get_wan_failover_status",
    "unifi_get_dream_machine_wan_status",
    "unifi_check_wan_connectivity",
    "unifi_list_firewall_policies",
    "unifi_get_firewall_policy_details",
    "unifi_toggle_firewall_policy",
    "unifi_update_firewall_policy",
    "unifi_create_firewall_policy",
    "unifi_create_simple_firewall_policy",
    "unifi_list_firewall_zones",
    "unifi_list_ip_groups",
    "unifi_list_traffic_routes",
    "unifi_create_traffic_route",
    "unifi_toggle_traffic_route",
    "unifi_update_traffic_route",
    "unifi_delete_traffic_route",
    "unifi_get_network_health",
    "unifi_get_system_info",
];

#[test]
fn test_registry_matches_tool_surface() {
    let harness = TestHarness::new();
    let registered: BTreeSet<String> = harness.registry.tool_names().into_iter().collect();
    let expected: BTreeSet<String> = EXPECTED_TOOLS.iter().map(|s| s.to_string()).collect();
    assert_eq!(registered, expected);
    assert_eq!(harness.registry.tool_count(), EXPECTED_TOOLS.len());
}

#[test]
fn test_guide_tools_are_registered() {
    let harness = TestHarness::new();
    for tool in guide::referenced_tools() {
        assert!(harness.registry.has_tool(tool), "{tool}");
    }
}

#[test]
fn test_every_tool_has_a_description() {
    let harness = TestHarness::new();
    for tool in harness.registry.tools() {
        assert!(
            tool.description.as_deref().is_some_and(|d| !d.is_empty()),
            "{}",
            tool.name
        );
    }
}

#[tokio::test]
async fn test_read_tools_never_write() {
    let harness = TestHarness::new();
    let reads = [
        ("unifi_list_devices", json!({})),
        ("unifi_list_switch_ports", json!({"device_mac": crate::common::SWITCH_MAC})),
        ("unifi_list_known_clients", json!({})),
        ("unifi_list_dhcp_reservations", json!({})),
        ("unifi_list_available_ips", json!({"network_id": "n1"})),
        ("unifi_list_wlans", json!({})),
        ("unifi_list_firewall_policies", json!({})),
        ("unifi_list_traffic_routes", json!({})),
    ];
    for (tool, args) in reads {
        let body = harness.call(tool, args).await;
        assert_eq!(body["success"], true, "{tool}: {body}");
    }
    assert!(harness.mock.mutating_requests().is_empty());
}

#[tokio::test]
async fn test_health_reports_tool_count() {
    let harness = TestHarness::new();
    let body = harness.call("health", json!({})).await;
    assert_eq!(body["tool_count"], EXPECTED_TOOLS.len());
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_list_wlans_redacts_passphrase() {
    let harness = TestHarness::new();
    let body = harness.call("unifi_list_wlans", json!({})).await;
    assert!(!body.to_string().contains("secretpass"));
}
