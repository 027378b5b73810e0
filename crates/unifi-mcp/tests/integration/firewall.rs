//! Firewall policy creation fails without touching the controller.

use serde_json::json;
use unifi_core::{ActionPolicy, Permissions};

use crate::common::{TestHarness, envelope};

const CREATION_TOOLS: [&str; 2] = [
    "unifi_create_firewall_policy",
    "unifi_create_simple_firewall_policy",
];

#[tokio::test]
async fn test_creation_always_fails_without_requests() {
    for tool in CREATION_TOOLS {
        let harness = TestHarness::new();
        let args = json!({
            "policy_data": {"name": "Block IoT", "action": "BLOCK"},
            "policy": {"name": "Block IoT", "action": "block"},
            "confirm": true
        });
        let result = harness.call_result(tool, args).await;
        assert_eq!(result.is_error, Some(true), "{tool}");
        let body = envelope(&result);
        assert_eq!(body["success"], false);
        assert_eq!(body["retryable"], false, "{tool}");
        let alternatives = body["alternatives"].as_object().unwrap();
        assert!(alternatives.len() >= 4, "{tool}: {body}");
        assert_eq!(harness.mock.request_count(), 0, "{tool} contacted the controller");
    }
}

#[tokio::test]
async fn test_creation_is_not_retried() {
    let harness = TestHarness::new();
    for _ in 0..3 {
        harness
            .call("unifi_create_firewall_policy", json!({"confirm": true}))
            .await;
    }
    assert_eq!(harness.mock.request_count(), 0);
}

#[tokio::test]
async fn test_creation_reports_workarounds_even_when_read_only() {
    let read_only = Permissions {
        default: ActionPolicy {
            read: true,
            create: false,
            update: false,
            delete: false,
        },
        ..Permissions::default()
    };
    let harness = TestHarness::with_permissions(read_only);
    let body = harness
        .call("unifi_create_simple_firewall_policy", json!({}))
        .await;
    assert!(body.get("alternatives").is_some(), "{body}");
}

#[tokio::test]
async fn test_existing_policies_can_still_be_toggled() {
    let harness = TestHarness::new();
    let body = harness
        .call(
            "unifi_toggle_firewall_policy",
            json!({"policy_id": "p1", "confirm": true}),
        )
        .await;
    assert_eq!(body["success"], true, "{body}");
    assert_eq!(harness.mock.mutating_requests().len(), 1);
}
