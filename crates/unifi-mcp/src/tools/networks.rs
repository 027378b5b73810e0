//! LAN/VLAN network and WLAN tools.

use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use unifi_core::{Action, ToolResponse};

use crate::registry::{ToolRegistry, ToolResult};
use crate::tools::common::{NoArgs, ToolContext, field_names, handle, make_tool, require_confirm};

const CATEGORY: &str = "networks";

const REDACTED: &str = "********";

/// `{"network_id": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct NetworkArgs {
    /// Network id.
    pub network_id: String,
}

/// New network definition.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateNetworkArgs {
    /// Network object: `name` and `purpose` are required; `vlan_enabled`,
    /// `vlan`, `ip_subnet`, `dhcpd_*` and `network_isolation_enabled` are
    /// optional.
    pub network_data: Value,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// Fields to merge into an existing network.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateNetworkArgs {
    /// Network id.
    pub network_id: String,
    /// Fields to change, e.g. `{"network_isolation_enabled": true}`.
    pub update_data: Map<String, Value>,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// `{"network_id": ..., "confirm": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConfirmNetworkArgs {
    /// Network id.
    pub network_id: String,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// `{"wlan_id": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WlanArgs {
    /// WLAN id.
    pub wlan_id: String,
}

/// New WLAN definition.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateWlanArgs {
    /// WLAN object: `name`, `security` and `enabled` are required;
    /// `x_passphrase` is required unless `security` is `open`.
    pub wlan_data: Value,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// Fields to merge into an existing WLAN.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateWlanArgs {
    /// WLAN id.
    pub wlan_id: String,
    /// Fields to change.
    pub update_data: Map<String, Value>,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// `{"wlan_id": ..., "confirm": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConfirmWlanArgs {
    /// WLAN id.
    pub wlan_id: String,
    /// Must be true to apply.
    #[serde(default)]
    pub confirm: bool,
}

/// Copy of a WLAN payload with the passphrase masked.
fn redact(wlan: &Map<String, Value>) -> Value {
    let mut shown = wlan.clone();
    if let Some(passphrase) = shown.get_mut("x_passphrase") {
        *passphrase = json!(REDACTED);
    }
    Value::Object(shown)
}

fn created_id(created: &Value) -> Value {
    created.get("_id").cloned().unwrap_or(Value::Null)
}

/// Network and WLAN tools.
#[derive(Clone)]
pub struct NetworkTools {
    ctx: ToolContext,
}

impl NetworkTools {
    /// Tools over `ctx`.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    // -- Networks ------------------------------------------------------------

    async fn list_networks(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let networks = self.ctx.managers.networks.list_networks().await?;
                Ok(ToolResponse::ok()
                    .with("site", self.ctx.managers.site())
                    .with("count", networks.len())
                    .with("networks", networks))
            })
            .await
    }

    async fn get_network(&self, args: NetworkArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let details = self.ctx.managers.networks.get_network(&args.network_id).await?;
                Ok(ToolResponse::ok()
                    .with("network_id", args.network_id.as_str())
                    .with("details", details))
            })
            .await
    }

    async fn create_network(&self, args: CreateNetworkArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Create, async {
                let networks = &self.ctx.managers.networks;
                let body = networks.prepare_network(&args.network_data)?;
                let name = body.get("name").and_then(Value::as_str).unwrap_or_default();
                let warning = format!("This will create network '{name}'");
                if let Some(pending) =
                    require_confirm(args.confirm, warning, Some(Value::Object(body.clone())))
                {
                    return Ok(pending);
                }
                let created = networks.create_network(&args.network_data).await?;
                Ok(ToolResponse::ok()
                    .with("message", format!("Network '{name}' created"))
                    .with("network_id", created_id(&created))
                    .with("details", created))
            })
            .await
    }

    async fn update_network(&self, args: UpdateNetworkArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                if args.update_data.is_empty() {
                    return Ok(ToolResponse::failure("update_data cannot be empty"));
                }
                let fields = field_names(&args.update_data);
                let warning = format!(
                    "This will update network {} ({}). Changes to a WAN network can interrupt internet access",
                    args.network_id,
                    fields.join(", ")
                );
                let preview = json!({
                    "network_id": args.network_id,
                    "changes": args.update_data,
                });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                let updated = self
                    .ctx
                    .managers
                    .networks
                    .update_network(&args.network_id, &args.update_data)
                    .await?;
                Ok(ToolResponse::ok()
                    .with("network_id", args.network_id.as_str())
                    .with("updated_fields", fields)
                    .with("details", updated))
            })
            .await
    }

    async fn delete_network(&self, args: ConfirmNetworkArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Delete, async {
                let warning = format!(
                    "This will permanently delete network {}. Clients on it lose connectivity",
                    args.network_id
                );
                let preview = json!({ "network_id": args.network_id });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                self.ctx
                    .managers
                    .networks
                    .delete_network(&args.network_id)
                    .await?;
                Ok(ToolResponse::ok()
                    .with("network_id", args.network_id.as_str())
                    .with("message", format!("Network {} deleted", args.network_id)))
            })
            .await
    }

    // -- WLANs ---------------------------------------------------------------

    async fn list_wlans(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let wlans = self.ctx.managers.networks.list_wlans().await?;
                let wlans: Vec<Value> = wlans
                    .into_iter()
                    .map(|w| match w {
                        Value::Object(map) => redact(&map),
                        other => other,
                    })
                    .collect();
                Ok(ToolResponse::ok()
                    .with("site", self.ctx.managers.site())
                    .with("count", wlans.len())
                    .with("wlans", wlans))
            })
            .await
    }

    async fn get_wlan(&self, args: WlanArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let details = self.ctx.managers.networks.get_wlan(&args.wlan_id).await?;
                Ok(ToolResponse::ok()
                    .with("wlan_id", args.wlan_id.as_str())
                    .with("details", details))
            })
            .await
    }

    async fn create_wlan(&self, args: CreateWlanArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Create, async {
                let networks = &self.ctx.managers.networks;
                let body = networks.prepare_wlan(&args.wlan_data)?;
                let name = body.get("name").and_then(Value::as_str).unwrap_or_default();
                let warning = format!("This will create wireless network '{name}'");
                if let Some(pending) = require_confirm(args.confirm, warning, Some(redact(&body))) {
                    return Ok(pending);
                }
                let created = networks.create_wlan(&args.wlan_data).await?;
                let shown = match &created {
                    Value::Object(map) => redact(map),
                    other => other.clone(),
                };
                Ok(ToolResponse::ok()
                    .with("message", format!("WLAN '{name}' created"))
                    .with("wlan_id", created_id(&created))
                    .with("details", shown))
            })
            .await
    }

    async fn update_wlan(&self, args: UpdateWlanArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                if args.update_data.is_empty() {
                    return Ok(ToolResponse::failure("update_data cannot be empty"));
                }
                let fields = field_names(&args.update_data);
                let warning = format!(
                    "This will update WLAN {} ({}). Connected clients may be disconnected",
                    args.wlan_id,
                    fields.join(", ")
                );
                let preview = json!({
                    "wlan_id": args.wlan_id,
                    "changes": redact(&args.update_data),
                });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                let updated = self
                    .ctx
                    .managers
                    .networks
                    .update_wlan(&args.wlan_id, &args.update_data)
                    .await?;
                let shown = match &updated {
                    Value::Object(map) => redact(map),
                    other => other.clone(),
                };
                Ok(ToolResponse::ok()
                    .with("wlan_id", args.wlan_id.as_str())
                    .with("updated_fields", fields)
                    .with("details", shown))
            })
            .await
    }

    async fn toggle_wlan(&self, args: ConfirmWlanArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                let warning = format!(
                    "This will toggle WLAN {}. Disabling it disconnects its clients",
                    args.wlan_id
                );
                let preview = json!({ "wlan_id": args.wlan_id });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                let enabled = self.ctx.managers.networks.toggle_wlan(&args.wlan_id).await?;
                let state = if enabled { "enabled" } else { "disabled" };
                Ok(ToolResponse::ok()
                    .with("wlan_id", args.wlan_id.as_str())
                    .with("enabled", enabled)
                    .with("message", format!("WLAN {} {state}", args.wlan_id)))
            })
            .await
    }

    async fn delete_wlan(&self, args: ConfirmWlanArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Delete, async {
                let warning = format!(
                    "This will permanently delete WLAN {}. Its clients lose connectivity",
                    args.wlan_id
                );
                let preview = json!({ "wlan_id": args.wlan_id });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                self.ctx.managers.networks.delete_wlan(&args.wlan_id).await?;
                Ok(ToolResponse::ok()
                    .with("wlan_id", args.wlan_id.as_str())
                    .with("message", format!("WLAN {} deleted", args.wlan_id)))
            })
            .await
    }
}

impl ToolRegistry for NetworkTools {
    fn tools(&self) -> Vec<Tool> {
        vec![
            make_tool::<NoArgs>(
                "unifi_list_networks",
                "List all LAN, VLAN and WAN networks",
            ),
            make_tool::<NetworkArgs>(
                "unifi_get_network_details",
                "Get the configuration of one network",
            ),
            make_tool::<CreateNetworkArgs>(
                "unifi_create_network",
                "Create a LAN or VLAN network. Requires confirm=true",
            ),
            make_tool::<UpdateNetworkArgs>(
                "unifi_update_network",
                "Update fields of a network, e.g. network_isolation_enabled to isolate a VLAN. Requires confirm=true",
            ),
            make_tool::<ConfirmNetworkArgs>(
                "unifi_delete_network",
                "Delete a network. Requires confirm=true and the delete permission",
            ),
            make_tool::<NoArgs>("unifi_list_wlans", "List all wireless networks"),
            make_tool::<WlanArgs>(
                "unifi_get_wlan_details",
                "Get the configuration of one wireless network",
            ),
            make_tool::<CreateWlanArgs>(
                "unifi_create_wlan",
                "Create a wireless network. Requires confirm=true",
            ),
            make_tool::<UpdateWlanArgs>(
                "unifi_update_wlan",
                "Update fields of a wireless network. Requires confirm=true",
            ),
            make_tool::<ConfirmWlanArgs>(
                "unifi_toggle_wlan",
                "Enable or disable a wireless network. Requires confirm=true",
            ),
            make_tool::<ConfirmWlanArgs>(
                "unifi_delete_wlan",
                "Delete a wireless network. Requires confirm=true and the delete permission",
            ),
        ]
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        let tools = self.clone();
        match name {
            "unifi_list_networks" => Some(handle(args, move |_: NoArgs| async move {
                tools.list_networks().await
            })),
            "unifi_get_network_details" => Some(handle(args, move |a: NetworkArgs| async move {
                tools.get_network(a).await
            })),
            "unifi_create_network" => Some(handle(args, move |a: CreateNetworkArgs| async move {
                tools.create_network(a).await
            })),
            "unifi_update_network" => Some(handle(args, move |a: UpdateNetworkArgs| async move {
                tools.update_network(a).await
            })),
            "unifi_delete_network" => Some(handle(args, move |a: ConfirmNetworkArgs| async move {
                tools.delete_network(a).await
            })),
            "unifi_list_wlans" => Some(handle(args, move |_: NoArgs| async move {
                tools.list_wlans().await
            })),
            "unifi_get_wlan_details" => Some(handle(args, move |a: WlanArgs| async move {
                tools.get_wlan(a).await
            })),
            "unifi_create_wlan" => Some(handle(args, move |a: CreateWlanArgs| async move {
                tools.create_wlan(a).await
            })),
            "unifi_update_wlan" => Some(handle(args, move |a: UpdateWlanArgs| async move {
                tools.update_wlan(a).await
            })),
            "unifi_toggle_wlan" => Some(handle(args, move |a: ConfirmWlanArgs| async move {
                tools.toggle_wlan(a).await
            })),
            "unifi_delete_wlan" => Some(handle(args, move |a: ConfirmWlanArgs| async move {
                tools.delete_wlan(a).await
            })),
            _ => None,
        }
    }
}
