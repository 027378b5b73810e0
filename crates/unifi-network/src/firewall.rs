//! Firewall policies, zones, and IP groups.
//!
//! Listing, toggling, and updating policies work through the V2
//! `/firewall-policies` endpoint. Creating policies does not: the
//! controller's V2 implementation rejects or corrupts new policies, so the
//! creation entry points fail locally and point at workarounds.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use unifi_client::{ApiRequest, Connection};
use unifi_core::ResourceValidator;
use unifi_core::schema::firewall_policy_update_schema;

use crate::error::{Error, Result};
use crate::networks::merge;

const CACHE_FIREWALL: &str = "firewall_policies";

/// Why firewall policy creation is refused.
pub const CREATION_DEFECT: &str =
    "the controller's V2 firewall-policies API does not accept creation requests";

/// Working alternatives to creating firewall policies, keyed by approach.
pub const CREATION_ALTERNATIVES: [(&str, &str); 4] = [
    (
        "network_isolation",
        "Enable in Settings → Networks → [VLAN] → Network Isolation",
    ),
    (
        "traffic_routes",
        "Use unifi_create_traffic_route tool (fully functional)",
    ),
    (
        "port_isolation",
        "Use unifi_toggle_switch_port for port-level isolation",
    ),
    (
        "manual",
        "Create rules in UniFi Web UI at Settings → Firewall & Security",
    ),
];

/// The two ways of asking for a new firewall policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreationStyle {
    /// Full V2 policy object.
    Full,
    /// Simplified `src`/`dst` shorthand.
    Simple,
}

impl CreationStyle {
    fn operation(&self) -> &'static str {
        match self {
            CreationStyle::Full => "Firewall policy creation",
            CreationStyle::Simple => "Simplified firewall policy creation",
        }
    }
}

/// Error returned for every creation attempt.
pub fn creation_unavailable(style: CreationStyle) -> Error {
    Error::Core(unifi_core::Error::UpstreamDefect {
        operation: style.operation().to_string(),
        reason: CREATION_DEFECT.to_string(),
        workarounds: CREATION_ALTERNATIVES
            .iter()
            .map(|(_, how)| (*how).to_string())
            .collect(),
    })
}

/// Summary row for a policy listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PolicySummary {
    /// Policy id.
    pub id: Value,
    /// Name.
    pub name: Value,
    /// Whether the policy is active.
    pub enabled: Value,
    /// `accept`, `drop`, or `reject`.
    pub action: Value,
    /// Position in the ruleset (`index`, else `rule_index`).
    pub rule_index: Value,
    /// Ruleset.
    pub ruleset: Value,
    /// Description (`description`, else `desc`, else empty).
    pub description: Value,
}

impl PolicySummary {
    /// Summarize a raw policy.
    pub fn from_policy(policy: &Value) -> Self {
        let field = |key: &str| policy.get(key).cloned().unwrap_or(Value::Null);
        let first = |keys: &[&str], default: Value| {
            keys.iter()
                .find_map(|k| policy.get(*k).cloned())
                .unwrap_or(default)
        };
        Self {
            id: field("_id"),
            name: field("name"),
            enabled: field("enabled"),
            action: field("action"),
            rule_index: first(&["index", "rule_index"], Value::Null),
            ruleset: field("ruleset"),
            description: first(&["description", "desc"], Value::String(String::new())),
        }
    }
}

fn is_predefined(policy: &Value) -> bool {
    policy
        .get("predefined")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Manages firewall policies.
#[derive(Clone)]
pub struct FirewallManager {
    conn: Arc<Connection>,
}

impl FirewallManager {
    /// Create a manager over a shared connection.
    pub fn new(conn: Arc<Connection>) -> Self {
        Self { conn }
    }

    /// Site the policies belong to.
    pub fn site(&self) -> &str {
        self.conn.site()
    }

    /// Policies, optionally including controller-defined ones.
    pub async fn list_policies(&self, include_predefined: bool) -> Result<Vec<Value>> {
        let policies = self
            .conn
            .cached_list(CACHE_FIREWALL, ApiRequest::get("/firewall-policies").v2())
            .await?;
        Ok(policies
            .into_iter()
            .filter(|p| include_predefined || !is_predefined(p))
            .collect())
    }

    /// One policy by id, predefined ones included.
    pub async fn get_policy(&self, policy_id: &str) -> Result<Value> {
        self.list_policies(true)
            .await?
            .into_iter()
            .find(|p| p.get("_id").and_then(Value::as_str) == Some(policy_id))
            .ok_or_else(|| Error::not_found("Firewall policy", policy_id))
    }

    async fn put_policy(&self, policy_id: &str, body: Value) -> Result<()> {
        self.conn
            .request(ApiRequest::put(format!("/firewall-policies/{policy_id}"), body).v2())
            .await?;
        self.conn.invalidate(Some(CACHE_FIREWALL));
        Ok(())
    }

    /// Flip a policy's `enabled` flag. Returns the updated policy.
    pub async fn toggle_policy(&self, policy_id: &str) -> Result<Value> {
        let policy = self.get_policy(policy_id).await?;
        let enabled = !policy.get("enabled").and_then(Value::as_bool).unwrap_or(false);
        let mut updates = Map::new();
        updates.insert("enabled".into(), Value::Bool(enabled));
        let updated = merge(&policy, &updates);
        self.put_policy(policy_id, updated.clone()).await?;
        tracing::info!(policy_id, enabled, "firewall policy toggled");
        Ok(updated)
    }

    /// Check an update payload without sending it. Returns the fields as
    /// they would be merged, with `rule_index` renamed to `index`. Giving
    /// both names is a validation error.
    pub fn validate_update(&self, updates: &Value) -> Result<Map<String, Value>> {
        let validator =
            ResourceValidator::new("Firewall policy update", &firewall_policy_update_schema())?;
        let mut fields = validator.validate(updates)?;
        if let Some(index) = fields.remove("rule_index") {
            if fields.contains_key("index") {
                return Err(unifi_core::Error::validation_field(
                    "rule_index",
                    "rule_index and index name the same field; give only one",
                )
                .into());
            }
            fields.insert("index".into(), index);
        }
        Ok(fields)
    }

    /// Validate and merge `updates` into a policy. Returns the updated policy.
    pub async fn update_policy(&self, policy_id: &str, updates: &Value) -> Result<Value> {
        let fields = self.validate_update(updates)?;
        let policy = self.get_policy(policy_id).await?;
        let updated = merge(&policy, &fields);
        self.put_policy(policy_id, updated.clone()).await?;
        tracing::info!(
            policy_id,
            fields = ?fields.keys().collect::<Vec<_>>(),
            "firewall policy updated"
        );
        Ok(updated)
    }

    /// Always fails; see [`creation_unavailable`]. Nothing is sent.
    pub fn create_policy(&self, style: CreationStyle) -> Result<Value> {
        tracing::warn!(operation = style.operation(), "refusing firewall policy creation");
        Err(creation_unavailable(style))
    }

    /// Firewall zones (V2 `/firewall/zone`).
    pub async fn list_zones(&self) -> Result<Vec<Value>> {
        Ok(self
            .conn
            .request_list(ApiRequest::get("/firewall/zone").v2())
            .await?)
    }

    /// Address and port groups (`/rest/firewallgroup`).
    pub async fn list_ip_groups(&self) -> Result<Vec<Value>> {
        Ok(self
            .conn
            .request_list(ApiRequest::get("/rest/firewallgroup"))
            .await?)
    }
}
