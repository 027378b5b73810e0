//! Traffic route tools.
//!
//! Policy-based routes are the working way to steer or restrict traffic
//! while firewall policy creation is unavailable.

use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use unifi_core::{Action, ToolResponse};

use crate::registry::{ToolRegistry, ToolResult};
use crate::tools::common::{
    NoArgs, ToolContext, field_names, handle, make_tool, require_confirm,
};

const CATEGORY: &str = "traffic_routes";

/// `{"route_data": {...}, "confirm": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateRouteArgs {
    /// Route definition: `description`, `matching_target` (INTERNET,
    /// DOMAIN, IP or REGION), `network_id` (the interface to route
    /// through), `target_devices`, plus the match lists.
    pub route_data: Value,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// `{"route_id": ..., "confirm": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConfirmRouteArgs {
    /// Route id.
    pub route_id: String,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// `{"route_id": ..., "update_data": {...}, "confirm": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateRouteArgs {
    /// Route id.
    pub route_id: String,
    /// Fields to change, e.g. `{"kill_switch_enabled": true}`.
    pub update_data: Map<String, Value>,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
struct RouteSummary {
    id: Value,
    description: Value,
    enabled: bool,
    matching_target: Value,
    network_id: Value,
    next_hop: Value,
    kill_switch_enabled: bool,
    target_devices: usize,
}

impl From<&Value> for RouteSummary {
    fn from(route: &Value) -> Self {
        let field = |key: &str| route.get(key).cloned().unwrap_or(Value::Null);
        let flag = |key: &str| route.get(key).and_then(Value::as_bool).unwrap_or(false);
        Self {
            id: field("_id"),
            description: field("description"),
            enabled: flag("enabled"),
            matching_target: field("matching_target"),
            network_id: field("network_id"),
            next_hop: field("next_hop"),
            kill_switch_enabled: flag("kill_switch_enabled"),
            target_devices: route
                .get("target_devices")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
        }
    }
}

fn label(route: &Value, route_id: &str) -> String {
    route
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or(route_id)
        .to_string()
}

/// Traffic route tools.
#[derive(Clone)]
pub struct TrafficRouteTools {
    ctx: ToolContext,
}

impl TrafficRouteTools {
    /// Tools over `ctx`.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn list_routes(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let routes = self.ctx.managers.traffic_routes.list_routes().await?;
                let summaries: Vec<RouteSummary> = routes.iter().map(RouteSummary::from).collect();
                Ok(ToolResponse::ok()
                    .with("site", self.ctx.managers.site())
                    .with("count", summaries.len())
                    .with_serialized("routes", &summaries))
            })
            .await
    }

    async fn create_route(&self, args: CreateRouteArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Create, async {
                let routes = &self.ctx.managers.traffic_routes;
                let body = routes.prepare_route(&args.route_data)?;
                let description = body
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let warning = format!(
                    "This will create traffic route '{description}'. Matching traffic from the target devices will be rerouted"
                );
                if let Some(pending) =
                    require_confirm(args.confirm, warning, Some(Value::Object(body)))
                {
                    return Ok(pending);
                }
                let created = routes.create_route(&args.route_data).await?;
                let id = created.get("_id").cloned().unwrap_or(Value::Null);
                Ok(ToolResponse::ok()
                    .with("route_id", id)
                    .with("message", format!("Traffic route '{description}' created"))
                    .with("details", created))
            })
            .await
    }

    async fn toggle_route(&self, args: ConfirmRouteArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                let warning = format!(
                    "This will toggle traffic route {} between enabled and disabled",
                    args.route_id
                );
                let preview = json!({ "route_id": args.route_id });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                let updated = self
                    .ctx
                    .managers
                    .traffic_routes
                    .toggle_route(&args.route_id)
                    .await?;
                let enabled = updated
                    .get("enabled")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let state = if enabled { "enabled" } else { "disabled" };
                Ok(ToolResponse::ok()
                    .with("route_id", args.route_id.as_str())
                    .with("enabled", enabled)
                    .with(
                        "message",
                        format!(
                            "Traffic route '{}' {state}",
                            label(&updated, &args.route_id)
                        ),
                    ))
            })
            .await
    }

    async fn update_route(&self, args: UpdateRouteArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                if args.update_data.is_empty() {
                    return Ok(ToolResponse::failure("update_data cannot be empty"));
                }
                let fields = field_names(&args.update_data);
                let warning = format!(
                    "This will update traffic route {} ({})",
                    args.route_id,
                    fields.join(", ")
                );
                let preview = json!({
                    "route_id": args.route_id,
                    "changes": args.update_data,
                });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                let updated = self
                    .ctx
                    .managers
                    .traffic_routes
                    .update_route(&args.route_id, &Value::Object(args.update_data.clone()))
                    .await?;
                Ok(ToolResponse::ok()
                    .with("route_id", args.route_id.as_str())
                    .with("updated_fields", fields)
                    .with("details", updated))
            })
            .await
    }

    async fn delete_route(&self, args: ConfirmRouteArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Delete, async {
                let warning = format!(
                    "This will permanently delete traffic route {}",
                    args.route_id
                );
                let preview = json!({ "route_id": args.route_id });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                self.ctx
                    .managers
                    .traffic_routes
                    .delete_route(&args.route_id)
                    .await?;
                Ok(ToolResponse::ok()
                    .with("route_id", args.route_id.as_str())
                    .with("message", format!("Traffic route {} deleted", args.route_id)))
            })
            .await
    }
}

impl ToolRegistry for TrafficRouteTools {
    fn tools(&self) -> Vec<Tool> {
        vec![
            make_tool::<NoArgs>(
                "unifi_list_traffic_routes",
                "List policy-based traffic routes",
            ),
            make_tool::<CreateRouteArgs>(
                "unifi_create_traffic_route",
                "Create a traffic route that sends matching traffic through a chosen network or VPN. Requires confirm=true",
            ),
            make_tool::<ConfirmRouteArgs>(
                "unifi_toggle_traffic_route",
                "Enable or disable a traffic route. Requires confirm=true",
            ),
            make_tool::<UpdateRouteArgs>(
                "unifi_update_traffic_route",
                "Update fields of a traffic route. Requires confirm=true",
            ),
            make_tool::<ConfirmRouteArgs>(
                "unifi_delete_traffic_route",
                "Delete a traffic route. Requires confirm=true and the delete permission",
            ),
        ]
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        let tools = self.clone();
        match name {
            "unifi_list_traffic_routes" => Some(handle(args, move |_: NoArgs| async move {
                tools.list_routes().await
            })),
            "unifi_create_traffic_route" => {
                Some(handle(args, move |a: CreateRouteArgs| async move {
                    tools.create_route(a).await
                }))
            }
            "unifi_toggle_traffic_route" => {
                Some(handle(args, move |a: ConfirmRouteArgs| async move {
                    tools.toggle_route(a).await
                }))
            }
            "unifi_update_traffic_route" => {
                Some(handle(args, move |a: UpdateRouteArgs| async move {
                    tools.update_route(a).await
                }))
            }
            "unifi_delete_traffic_route" => {
                Some(handle(args, move |a: ConfirmRouteArgs| async move {
                    tools.delete_route(a).await
                }))
            }
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
    use unifi_client::{ApiVersion, HttpMethod, MockController};

    fn mock() -> Arc<MockController> {
        let mock = MockController::new().accept_writes();
        mock.respond_get(
            "/trafficroutes",
            json!([{
                "_id": "r1",
                "description": "Streaming via VPN",
                "enabled": true,
                "matching_target": "DOMAIN",
                "network_id": "vpn1",
                "domains": [{"domain": "example.com"}],
                "target_devices": [{"type": "ALL_CLIENTS"}]
            }]),
        );
        Arc::new(mock)
    }

    fn new_route() -> Value {
        json!({
            "description": "Work laptop via VPN",
            "matching_target": "INTERNET",
            "network_id": "vpn1",
            "target_devices": [{"type": "CLIENT", "client_mac": "11:22:33:44:55:66"}]
        })
    }

    async fn call(tools: &TrafficRouteTools, name: &str, args: Value) -> Value {
        result_json(&tools.call(name, args).unwrap().await.unwrap())
    }

    #[tokio::test]
    async fn test_list_routes() {
        let mock = mock();
        let tools = TrafficRouteTools::new(test_context(&mock));
        let body = call(&tools, "unifi_list_traffic_routes", json!({})).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["routes"][0]["id"], "r1");
        assert_eq!(body["routes"][0]["target_devices"], 1);
        assert_eq!(mock.last_request().unwrap().version, ApiVersion::V2);
    }

    #[tokio::test]
    async fn test_create_preview_applies_defaults_without_requests() {
        let mock = mock();
        let tools = TrafficRouteTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_create_traffic_route",
            json!({"route_data": new_route()}),
        )
        .await;
        assert_eq!(body["error"], unifi_core::CONFIRMATION_REQUIRED);
        assert_eq!(body["preview"]["enabled"], true);
        assert_eq!(body["preview"]["kill_switch_enabled"], false);
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_route_before_confirmation() {
        let mock = mock();
        let tools = TrafficRouteTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_create_traffic_route",
            json!({"route_data": {"description": "x"}, "confirm": true}),
        )
        .await;
        assert_eq!(body["success"], false);
        assert!(body.get("warning").is_none());
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_create_confirmed() {
        let mock = mock();
        mock.respond(
            HttpMethod::Post,
            "/trafficroutes",
            json!({"_id": "r2", "description": "Work laptop via VPN"}),
        );
        let tools = TrafficRouteTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_create_traffic_route",
            json!({"route_data": new_route(), "confirm": true}),
        )
        .await;
        assert_eq!(body["success"], true);
        assert_eq!(body["route_id"], "r2");
        let request = mock.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.version, ApiVersion::V2);
        assert_eq!(request.data.unwrap()["regions"], json!([]));
    }

    #[tokio::test]
    async fn test_toggle_confirmed() {
        let mock = mock();
        let tools = TrafficRouteTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_toggle_traffic_route",
            json!({"route_id": "r1", "confirm": true}),
        )
        .await;
        assert_eq!(body["enabled"], false);
        assert_eq!(body["message"], "Traffic route 'Streaming via VPN' disabled");
        let request = mock.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Put);
        assert_eq!(request.path, "/trafficroutes/r1");
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_fields() {
        let mock = mock();
        let tools = TrafficRouteTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_update_traffic_route",
            json!({"route_id": "r1", "update_data": {"bogus": 1}, "confirm": true}),
        )
        .await;
        assert_eq!(body["success"], false);
        assert!(mock.mutating_requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let mock = mock();
        let tools = TrafficRouteTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_update_traffic_route",
            json!({"route_id": "r1", "update_data": {"kill_switch_enabled": true}, "confirm": true}),
        )
        .await;
        assert_eq!(body["success"], true);
        assert_eq!(body["updated_fields"], json!(["kill_switch_enabled"]));
        let data = mock.last_request().unwrap().data.unwrap();
        assert_eq!(data["kill_switch_enabled"], true);
        assert_eq!(data["description"], "Streaming via VPN");
    }

    #[tokio::test]
    async fn test_delete_needs_permission_and_confirmation() {
        let mock = mock();
        let tools = TrafficRouteTools::new(test_context(&mock));
        let body = call(
            &tools,
            "unifi_delete_traffic_route",
            json!({"route_id": "r1"}),
        )
        .await;
        assert_eq!(body["error"], unifi_core::CONFIRMATION_REQUIRED);

        let body = call(
            &tools,
            "unifi_delete_traffic_route",
            json!({"route_id": "r1", "confirm": true}),
        )
        .await;
        assert_eq!(body["success"], true);
        assert_eq!(mock.last_request().unwrap().method, HttpMethod::Delete);
    }
}
