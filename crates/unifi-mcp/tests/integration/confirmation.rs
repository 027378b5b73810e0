//! Every mutating tool previews first and sends nothing until confirmed.

use serde_json::{Value, json};
use unifi_core::CONFIRMATION_REQUIRED;

use crate::common::{CLIENT_MAC, SWITCH_MAC, TestHarness};

fn mutating_calls() -> Vec<(&'static str, Value)> {
    let port = |extra: Value| {
        let mut args = json!({"device_mac": SWITCH_MAC, "port_idx": 0});
        if let (Some(args), Some(extra)) = (args.as_object_mut(), extra.as_object()) {
            args.extend(extra.clone());
        }
        args
    };
    vec![
        ("unifi_reboot_device", json!({"mac": SWITCH_MAC})),
        ("unifi_adopt_device", json!({"mac": SWITCH_MAC})),
        ("unifi_upgrade_device", json!({"mac": SWITCH_MAC})),
        ("unifi_rename_device", json!({"mac": SWITCH_MAC, "name": "Rack switch"})),
        ("unifi_toggle_switch_port", port(json!({"enabled": false}))),
        ("unifi_set_port_poe", port(json!({"poe_mode": "off"}))),
        ("unifi_set_port_profile", port(json!({"portconf_id": "pc1"}))),
        ("unifi_set_port_name", port(json!({"name": "Camera"}))),
        ("unifi_restart_poe_port", port(json!({}))),
        ("unifi_block_client", json!({"mac": CLIENT_MAC})),
        ("unifi_unblock_client", json!({"mac": CLIENT_MAC})),
        ("unifi_reconnect_client", json!({"mac": CLIENT_MAC})),
        ("unifi_rename_client", json!({"mac": CLIENT_MAC, "name": "Desk"})),
        (
            "unifi_set_client_fixed_ip",
            json!({"mac_address": CLIENT_MAC, "fixed_ip": "10.0.0.20"}),
        ),
        (
            "unifi_remove_client_fixed_ip",
            json!({"mac_address": CLIENT_MAC}),
        ),
        (
            "unifi_create_dhcp_reservation",
            json!({"mac_address": "11:22:33:44:55:99", "fixed_ip": "10.0.0.21", "name": "Printer"}),
        ),
        (
            "unifi_create_network",
            json!({"network_data": {"name": "IoT", "purpose": "corporate", "vlan": 30}}),
        ),
        (
            "unifi_update_network",
            json!({"network_id": "n1", "update_data": {"network_isolation_enabled": true}}),
        ),
        ("unifi_delete_network", json!({"network_id": "n1"})),
        (
            "unifi_create_wlan",
            json!({"wlan_data": {"name": "Guest", "security": "wpapsk", "enabled": true, "x_passphrase": "longenough"}}),
        ),
        (
            "unifi_update_wlan",
            json!({"wlan_id": "w1", "update_data": {"hide_ssid": true}}),
        ),
        ("unifi_toggle_wlan", json!({"wlan_id": "w1"})),
        ("unifi_delete_wlan", json!({"wlan_id": "w1"})),
        ("unifi_toggle_firewall_policy", json!({"policy_id": "p1"})),
        (
            "unifi_update_firewall_policy",
            json!({"policy_id": "p1", "update_data": {"enabled": false}}),
        ),
        (
            "unifi_create_traffic_route",
            json!({"route_data": {
                "description": "Laptop via VPN",
                "matching_target": "INTERNET",
                "network_id": "vpn1",
                "target_devices": [{"type": "CLIENT", "client_mac": CLIENT_MAC}]
            }}),
        ),
        ("unifi_toggle_traffic_route", json!({"route_id": "r1"})),
        (
            "unifi_update_traffic_route",
            json!({"route_id": "r1", "update_data": {"kill_switch_enabled": true}}),
        ),
        ("unifi_delete_traffic_route", json!({"route_id": "r1"})),
    ]
}

#[tokio::test]
async fn test_unconfirmed_changes_send_no_requests() {
    for (tool, args) in mutating_calls() {
        let harness = TestHarness::new();
        let body = harness.call(tool, args).await;
        assert_eq!(body["success"], false, "{tool}");
        assert_eq!(body["error"], CONFIRMATION_REQUIRED, "{tool}: {body}");
        assert!(body["warning"].as_str().is_some_and(|w| !w.is_empty()), "{tool}");
        assert_eq!(harness.mock.request_count(), 0, "{tool} contacted the controller");
    }
}

#[tokio::test]
async fn test_explicit_false_is_not_confirmation() {
    let harness = TestHarness::new();
    let body = harness
        .call(
            "unifi_block_client",
            json!({"mac": CLIENT_MAC, "confirm": false}),
        )
        .await;
    assert_eq!(body["error"], CONFIRMATION_REQUIRED);
    assert_eq!(harness.mock.request_count(), 0);
}

#[tokio::test]
async fn test_confirmed_port_toggle_preserves_other_ports() {
    let harness = TestHarness::new();
    let body = harness
        .call(
            "unifi_toggle_switch_port",
            json!({"device_mac": SWITCH_MAC, "port_idx": 1, "enabled": false, "confirm": true}),
        )
        .await;
    assert_eq!(body["success"], true, "{body}");
    let writes = harness.mock.mutating_requests();
    assert_eq!(writes.len(), 1);
    let overrides = &writes[0].data.as_ref().unwrap()["port_overrides"];
    let overrides = overrides.as_array().unwrap();
    let toggled = overrides.iter().find(|o| o["port_idx"] == 1).unwrap();
    assert_eq!(toggled["forward"], "disabled");
    let untouched = overrides.iter().find(|o| o["port_idx"] == 0).unwrap();
    assert_eq!(untouched["name"], "Uplink");
    assert!(untouched.get("forward").is_none());
}

#[tokio::test]
async fn test_invalid_input_is_reported_before_confirmation() {
    let harness = TestHarness::new();
    let body = harness
        .call("unifi_block_client", json!({"mac": "not-a-mac"}))
        .await;
    assert_eq!(body["error"], "Invalid MAC address format");
    assert!(body.get("warning").is_none());
    assert_eq!(harness.mock.request_count(), 0);
}
