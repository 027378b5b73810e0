//! Client tools: connected and known clients, blocking, reconnecting and
//! aliases.

use rmcp::model::Tool;
use serde::Serialize;
use serde_json::{Value, json};
use unifi_core::{Action, ToolResponse};
use unifi_network::Client;

use crate::registry::{ToolRegistry, ToolResult};
use crate::tools::common::{
    ConfirmMacArgs, MacArgs, NoArgs, RenameArgs, ToolContext, check_mac, handle, make_tool,
    require_confirm,
};

const CATEGORY: &str = "clients";

#[derive(Debug, Serialize)]
struct ClientSummary {
    mac: String,
    name: String,
    hostname: Option<String>,
    ip: Option<String>,
    is_wired: Value,
    network: Value,
    essid: Value,
    uptime: Value,
    blocked: bool,
    use_fixedip: bool,
    fixed_ip: Option<String>,
}

impl From<&Client> for ClientSummary {
    fn from(client: &Client) -> Self {
        let field = |key: &str| client.extra.get(key).cloned().unwrap_or(Value::Null);
        Self {
            mac: client.mac.clone(),
            name: client.display_name().to_string(),
            hostname: client.hostname.clone(),
            ip: client.ip.clone(),
            is_wired: field("is_wired"),
            network: field("network"),
            essid: field("essid"),
            uptime: field("uptime"),
            blocked: client.blocked,
            use_fixedip: client.use_fixedip,
            fixed_ip: client.fixed_ip.clone(),
        }
    }
}

fn summarize(clients: &[Client]) -> ToolResponse {
    let summaries: Vec<ClientSummary> = clients.iter().map(ClientSummary::from).collect();
    ToolResponse::ok()
        .with("count", summaries.len())
        .with_serialized("clients", &summaries)
}

#[derive(Clone, Copy, Debug)]
enum StationCommand {
    Block,
    Unblock,
    Reconnect,
}

impl StationCommand {
    fn warning(self, mac: &str) -> String {
        match self {
            Self::Block => format!("This will block client {mac} from the network"),
            Self::Unblock => format!("This will unblock client {mac}"),
            Self::Reconnect => {
                format!("This will disconnect client {mac}; it will reconnect on its own")
            }
        }
    }

    fn done(self, mac: &str) -> String {
        match self {
            Self::Block => format!("Client {mac} blocked"),
            Self::Unblock => format!("Client {mac} unblocked"),
            Self::Reconnect => format!("Client {mac} forced to reconnect"),
        }
    }
}

/// Client tools.
#[derive(Clone)]
pub struct ClientTools {
    ctx: ToolContext,
}

impl ClientTools {
    /// Tools over `ctx`.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn list_clients(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let clients = self.ctx.managers.clients.list_active().await?;
                Ok(summarize(&clients).with("site", self.ctx.managers.site()))
            })
            .await
    }

    async fn list_known_clients(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let clients = self.ctx.managers.clients.list_known().await?;
                Ok(summarize(&clients).with("site", self.ctx.managers.site()))
            })
            .await
    }

    async fn get_client_details(&self, args: MacArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                if let Some(invalid) = check_mac(&args.mac) {
                    return Ok(invalid);
                }
                let details = self.ctx.managers.clients.get_client_raw(&args.mac).await?;
                Ok(ToolResponse::ok()
                    .with("mac", args.mac.as_str())
                    .with("details", details))
            })
            .await
    }

    async fn station(&self, command: StationCommand, args: ConfirmMacArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                if let Some(invalid) = check_mac(&args.mac) {
                    return Ok(invalid);
                }
                let preview = json!({ "mac": args.mac });
                if let Some(pending) =
                    require_confirm(args.confirm, command.warning(&args.mac), Some(preview))
                {
                    return Ok(pending);
                }
                let clients = &self.ctx.managers.clients;
                match command {
                    StationCommand::Block => clients.block(&args.mac).await?,
                    StationCommand::Unblock => clients.unblock(&args.mac).await?,
                    StationCommand::Reconnect => clients.reconnect(&args.mac).await?,
                }
                Ok(ToolResponse::ok()
                    .with("mac", args.mac.as_str())
                    .with("message", command.done(&args.mac)))
            })
            .await
    }

    async fn rename_client(&self, args: RenameArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                if let Some(invalid) = check_mac(&args.mac) {
                    return Ok(invalid);
                }
                let warning = format!("This will rename client {} to '{}'", args.mac, args.name);
                let preview = json!({ "mac": args.mac, "name": args.name });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                self.ctx
                    .managers
                    .clients
                    .rename(&args.mac, &args.name)
                    .await?;
                Ok(ToolResponse::ok()
                    .with("mac", args.mac.as_str())
                    .with("name", args.name.as_str())
                    .with("message", format!("Client {} renamed to '{}'", args.mac, args.name)))
            })
            .await
    }
}

impl ToolRegistry for ClientTools {
    fn tools(&self) -> Vec<Tool> {
        vec![
            make_tool::<NoArgs>(
                "unifi_list_clients",
                "List clients currently connected to the site",
            ),
            make_tool::<NoArgs>(
                "unifi_list_known_clients",
                "List every client the controller knows, including offline ones and fixed IP reservations",
            ),
            make_tool::<MacArgs>(
                "unifi_get_client_details",
                "Get the controller record of a client by MAC address",
            ),
            make_tool::<ConfirmMacArgs>(
                "unifi_block_client",
                "Block a client from the network. Requires confirm=true",
            ),
            make_tool::<ConfirmMacArgs>(
                "unifi_unblock_client",
                "Unblock a previously blocked client. Requires confirm=true",
            ),
            make_tool::<ConfirmMacArgs>(
                "unifi_reconnect_client",
                "Force a client to disconnect and reconnect. Requires confirm=true",
            ),
            make_tool::<RenameArgs>(
                "unifi_rename_client",
                "Set the alias of a known client. Requires confirm=true",
            ),
        ]
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        let tools = self.clone();
        match name {
            "unifi_list_clients" => Some(handle(args, move |_: NoArgs| async move {
                tools.list_clients().await
            })),
            "unifi_list_known_clients" => Some(handle(args, move |_: NoArgs| async move {
                tools.list_known_clients().await
            })),
            "unifi_get_client_details" => Some(handle(args, move |a: MacArgs| async move {
                tools.get_client_details(a).await
            })),
            "unifi_block_client" => Some(handle(args, move |a: ConfirmMacArgs| async move {
                tools.station(StationCommand::Block, a).await
            })),
            "unifi_unblock_client" => Some(handle(args, move |a: ConfirmMacArgs| async move {
                tools.station(StationCommand::Unblock, a).await
            })),
            "unifi_reconnect_client" => Some(handle(args, move |a: ConfirmMacArgs| async move {
                tools.station(StationCommand::Reconnect, a).await
            })),
            "unifi_rename_client" => Some(handle(args, move |a: RenameArgs| async move {
                tools.rename_client(a).await
            })),
            _ => None,
        }
    }
}
