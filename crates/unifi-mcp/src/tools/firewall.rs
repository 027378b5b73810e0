//! Firewall policy tools.
//!
//! Listing, toggling and updating work. Both creation tools are
//! registered so that callers asking for them learn why creation fails and
//! what to use instead; they never reach the controller.

use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use unifi_core::{Action, ToolResponse};
use unifi_network::firewall::CREATION_ALTERNATIVES;
use unifi_network::{CreationStyle, PolicySummary};

use crate::registry::{ToolRegistry, ToolResult};
use crate::tools::common::{
    NoArgs, ToolContext, failure, field_names, handle, make_tool, require_confirm,
};

const CATEGORY: &str = "firewall";

/// Options for listing policies.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListPoliciesArgs {
    /// Include controller-defined policies. Defaults to false.
    #[serde(default)]
    pub include_predefined: bool,
}

/// `{"policy_id": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PolicyArgs {
    /// Policy id (`_id`).
    pub policy_id: String,
}

/// `{"policy_id": ..., "confirm": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TogglePolicyArgs {
    /// Policy id.
    pub policy_id: String,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// Fields to change on a policy.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdatePolicyArgs {
    /// Policy id.
    pub policy_id: String,
    /// Fields to change: `name`, `action`, `enabled`, `rule_index`,
    /// `protocol`, `logging`, `description`, ...
    pub update_data: Map<String, Value>,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// Full V2 policy object. Creation is not available.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CreatePolicyArgs {
    /// Policy definition.
    #[serde(default)]
    pub policy_data: Value,
}

/// Shorthand policy. Creation is not available.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CreateSimplePolicyArgs {
    /// `{"name", "ruleset", "action", "src", "dst", ...}`
    #[serde(default)]
    pub policy: Value,
    /// Ignored.
    #[serde(default)]
    pub confirm: bool,
}

fn alternatives() -> Value {
    let map: Map<String, Value> = CREATION_ALTERNATIVES
        .iter()
        .map(|(key, how)| ((*key).to_string(), json!(how)))
        .collect();
    Value::Object(map)
}

/// Firewall tools.
#[derive(Clone)]
pub struct FirewallTools {
    ctx: ToolContext,
}

impl FirewallTools {
    /// Tools over `ctx`.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn list_policies(&self, args: ListPoliciesArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let firewall = &self.ctx.managers.firewall;
                let policies = firewall.list_policies(args.include_predefined).await?;
                let summaries: Vec<PolicySummary> =
                    policies.iter().map(PolicySummary::from_policy).collect();
                Ok(ToolResponse::ok()
                    .with("site", firewall.site())
                    .with("count", summaries.len())
                    .with_serialized("policies", &summaries))
            })
            .await
    }

    async fn policy_details(&self, args: PolicyArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let details = self.ctx.managers.firewall.get_policy(&args.policy_id).await?;
                Ok(ToolResponse::ok()
                    .with("policy_id", args.policy_id.as_str())
                    .with("details", details))
            })
            .await
    }

    async fn toggle_policy(&self, args: TogglePolicyArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                let warning = format!(
                    "This will enable or disable firewall policy {}",
                    args.policy_id
                );
                let preview = json!({ "policy_id": args.policy_id });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                let updated = self
                    .ctx
                    .managers
                    .firewall
                    .toggle_policy(&args.policy_id)
                    .await?;
                let enabled = updated.get("enabled").and_then(Value::as_bool).unwrap_or(false);
                let name = updated
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(args.policy_id.as_str());
                let state = if enabled { "enabled" } else { "disabled" };
                Ok(ToolResponse::ok()
                    .with("policy_id", args.policy_id.as_str())
                    .with("enabled", enabled)
                    .with(
                        "message",
                        format!(
                            "Firewall policy '{name}' ({}) toggled successfully to {state}.",
                            args.policy_id
                        ),
                    ))
            })
            .await
    }

    async fn update_policy(&self, args: UpdatePolicyArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                if args.update_data.is_empty() {
                    return Ok(ToolResponse::failure("update_data cannot be empty"));
                }
                let firewall = &self.ctx.managers.firewall;
                let updates = Value::Object(args.update_data.clone());
                let fields = match firewall.validate_update(&updates) {
                    Ok(fields) => fields,
                    Err(err) => {
                        let reason = match err.as_core() {
                            Some(unifi_core::Error::Validation { message, .. }) => message.clone(),
                            _ => err.to_string(),
                        };
                        return Ok(ToolResponse::failure(format!(
                            "Invalid update data: {reason}"
                        )));
                    }
                };
                if fields.is_empty() {
                    return Ok(ToolResponse::failure(
                        "Update data is effectively empty or invalid.",
                    ));
                }
                let updated_fields = field_names(&fields);
                let warning = format!(
                    "This will update firewall policy {} ({})",
                    args.policy_id,
                    updated_fields.join(", ")
                );
                let preview = json!({ "policy_id": args.policy_id, "changes": fields });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                let details = firewall.update_policy(&args.policy_id, &updates).await?;
                Ok(ToolResponse::ok()
                    .with("policy_id", args.policy_id.as_str())
                    .with("updated_fields", updated_fields)
                    .with("details", details))
            })
            .await
    }

    /// Explain why creation is unavailable. Skips the permission check so
    /// the workarounds are reported even to read-only callers.
    fn creation_refused(&self, style: CreationStyle) -> ToolResponse {
        let headline = match style {
            CreationStyle::Full => "Firewall creation is NON-FUNCTIONAL due to UniFi API limitations",
            CreationStyle::Simple => "Firewall rule creation is BROKEN due to UniFi V2 API bugs",
        };
        let err = match self.ctx.managers.firewall.create_policy(style) {
            Ok(_) => return ToolResponse::failure(headline),
            Err(err) => err,
        };
        failure(&err)
            .with("error", headline)
            .with(
                "message",
                "The UniFi V2 Firewall API is broken. Please use these working alternatives:",
            )
            .with("alternatives", alternatives())
            .with(
                "technical_details",
                format!(
                    "UniFi V2 API at /v2/api/site/{}/firewall-policies has incomplete implementation",
                    self.ctx.managers.site()
                ),
            )
    }

    async fn list_zones(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let zones = self.ctx.managers.firewall.list_zones().await?;
                Ok(ToolResponse::ok()
                    .with("count", zones.len())
                    .with("zones", zones))
            })
            .await
    }

    async fn list_ip_groups(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let groups = self.ctx.managers.firewall.list_ip_groups().await?;
                Ok(ToolResponse::ok()
                    .with("count", groups.len())
                    .with("ip_groups", groups))
            })
            .await
    }
}

impl ToolRegistry for FirewallTools {
    fn tools(&self) -> Vec<Tool> {
        vec![
            make_tool::<ListPoliciesArgs>(
                "unifi_list_firewall_policies",
                "List firewall policies configured on the controller",
            ),
            make_tool::<PolicyArgs>(
                "unifi_get_firewall_policy_details",
                "Get detailed configuration for a firewall policy by id",
            ),
            make_tool::<TogglePolicyArgs>(
                "unifi_toggle_firewall_policy",
                "Enable or disable a firewall policy. Requires confirm=true",
            ),
            make_tool::<UpdatePolicyArgs>(
                "unifi_update_firewall_policy",
                "Update specific fields of an existing firewall policy. Requires confirm=true",
            ),
            make_tool::<CreatePolicyArgs>(
                "unifi_create_firewall_policy",
                "NON-FUNCTIONAL: the controller's V2 firewall API cannot create policies. Returns working alternatives (network isolation, traffic routes, port isolation, web UI)",
            ),
            make_tool::<CreateSimplePolicyArgs>(
                "unifi_create_simple_firewall_policy",
                "NON-FUNCTIONAL: simplified firewall rule creation fails for the same controller defect. Returns working alternatives",
            ),
            make_tool::<NoArgs>(
                "unifi_list_firewall_zones",
                "List firewall zones (V2 API)",
            ),
            make_tool::<NoArgs>(
                "unifi_list_ip_groups",
                "List IP and port groups configured on the controller",
            ),
        ]
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        let tools = self.clone();
        match name {
            "unifi_list_firewall_policies" => {
                Some(handle(args, move |a: ListPoliciesArgs| async move {
                    tools.list_policies(a).await
                }))
            }
            "unifi_get_firewall_policy_details" => {
                Some(handle(args, move |a: PolicyArgs| async move {
                    tools.policy_details(a).await
                }))
            }
            "unifi_toggle_firewall_policy" => {
                Some(handle(args, move |a: TogglePolicyArgs| async move {
                    tools.toggle_policy(a).await
                }))
            }
            "unifi_update_firewall_policy" => {
                Some(handle(args, move |a: UpdatePolicyArgs| async move {
                    tools.update_policy(a).await
                }))
            }
            "unifi_create_firewall_policy" => {
                Some(handle(args, move |_: CreatePolicyArgs| async move {
                    tools.creation_refused(CreationStyle::Full)
                }))
            }
            "unifi_create_simple_firewall_policy" => {
                Some(handle(args, move |_: CreateSimplePolicyArgs| async move {
                    tools.creation_refused(CreationStyle::Simple)
                }))
            }
            "unifi_list_firewall_zones" => Some(handle(args, move |_: NoArgs| async move {
                tools.list_zones().await
            })),
            "unifi_list_ip_groups" => Some(handle(args, move |_: NoArgs| async move {
                tools.list_ip_groups().await
            })),
            _ => None,
        }
    }
}
