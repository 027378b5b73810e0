//! The permission table is consulted before any controller request.

use serde_json::json;
use unifi_core::{CategoryPolicy, Permissions};

use crate::common::{CLIENT_MAC, TestHarness};

#[tokio::test]
async fn test_default_permissions_deny_delete() {
    let harness = TestHarness::with_permissions(Permissions::default());
    let body = harness
        .call(
            "unifi_delete_network",
            json!({"network_id": "n1", "confirm": true}),
        )
        .await;
    assert_eq!(body["success"], false);
    assert!(
        body["error"].as_str().unwrap().contains("Permission denied"),
        "{body}"
    );
    assert_eq!(harness.mock.request_count(), 0);
}

#[tokio::test]
async fn test_default_permissions_allow_reads_and_updates() {
    let harness = TestHarness::with_permissions(Permissions::default());
    let body = harness.call("unifi_list_networks", json!({})).await;
    assert_eq!(body["success"], true, "{body}");
    let body = harness
        .call(
            "unifi_block_client",
            json!({"mac": CLIENT_MAC, "confirm": true}),
        )
        .await;
    assert_eq!(body["success"], true, "{body}");
}

#[tokio::test]
async fn test_category_override_denies_updates() {
    let permissions = Permissions::allow_all().with_category(
        "clients",
        CategoryPolicy {
            update: Some(false),
            ..CategoryPolicy::default()
        },
    );
    let harness = TestHarness::with_permissions(permissions);
    let body = harness
        .call(
            "unifi_block_client",
            json!({"mac": CLIENT_MAC, "confirm": true}),
        )
        .await;
    assert!(body["error"].as_str().unwrap().contains("Permission denied"));
    assert_eq!(harness.mock.request_count(), 0);

    let body = harness.call("unifi_list_clients", json!({})).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_denied_before_confirmation_prompt() {
    let permissions = Permissions::allow_all().with_category(
        "networks",
        CategoryPolicy {
            delete: Some(false),
            ..CategoryPolicy::default()
        },
    );
    let harness = TestHarness::with_permissions(permissions);
    let body = harness
        .call("unifi_delete_wlan", json!({"wlan_id": "w1"}))
        .await;
    assert!(body["error"].as_str().unwrap().contains("Permission denied"));
    assert!(body.get("warning").is_none());
}
