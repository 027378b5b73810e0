//! Device tools: inventory, details, lifecycle commands and renaming.

use rmcp::model::Tool;
use serde::Serialize;
use serde_json::{Value, json};
use unifi_core::{Action, ToolResponse};

use crate::registry::{ToolRegistry, ToolResult};
use crate::tools::common::{
    ConfirmMacArgs, MacArgs, NoArgs, RenameArgs, ToolContext, check_mac, handle, make_tool,
    require_confirm,
};

const CATEGORY: &str = "devices";

/// One line of the device inventory.
#[derive(Debug, Serialize)]
struct DeviceSummary {
    mac: Value,
    name: Value,
    model: Value,
    #[serde(rename = "type")]
    kind: Value,
    ip: Value,
    state: Value,
    version: Value,
    uptime: Value,
    adopted: Value,
}

impl DeviceSummary {
    fn from_device(device: &Value) -> Self {
        let field = |key: &str| device.get(key).cloned().unwrap_or(Value::Null);
        Self {
            mac: field("mac"),
            name: device
                .get("name")
                .cloned()
                .unwrap_or_else(|| json!("Unnamed")),
            model: field("model"),
            kind: field("type"),
            ip: field("ip"),
            state: field("state"),
            version: field("version"),
            uptime: field("uptime"),
            adopted: field("adopted"),
        }
    }
}

/// A device lifecycle command exposed as its own tool.
#[derive(Clone, Copy, Debug)]
enum Lifecycle {
    Reboot,
    Adopt,
    Upgrade,
}

impl Lifecycle {
    fn warning(self, mac: &str) -> String {
        match self {
            Self::Reboot => format!(
                "This will reboot device {mac}. Connected clients will lose connectivity until it is back online"
            ),
            Self::Adopt => format!("This will adopt device {mac} into site management"),
            Self::Upgrade => format!(
                "This will upgrade the firmware of device {mac}. The device will reboot when done"
            ),
        }
    }

    fn done(self, mac: &str) -> String {
        match self {
            Self::Reboot => format!("Reboot command sent to device {mac}"),
            Self::Adopt => format!("Adoption started for device {mac}"),
            Self::Upgrade => format!("Firmware upgrade started for device {mac}"),
        }
    }
}

/// Device inventory and lifecycle tools.
#[derive(Clone)]
pub struct DeviceTools {
    ctx: ToolContext,
}

impl DeviceTools {
    /// Tools over `ctx`.
    pub fn new(ctx: ToolContext) -> Self {
        Self { ctx }
    }

    async fn list_devices(&self) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                let devices = self.ctx.managers.devices.list_devices_raw().await?;
                let summaries: Vec<DeviceSummary> =
                    devices.iter().map(DeviceSummary::from_device).collect();
                Ok(ToolResponse::ok()
                    .with("site", self.ctx.managers.site())
                    .with("count", summaries.len())
                    .with_serialized("devices", &summaries))
            })
            .await
    }

    async fn get_device_details(&self, args: MacArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Read, async {
                if let Some(invalid) = check_mac(&args.mac) {
                    return Ok(invalid);
                }
                let details = self.ctx.managers.devices.get_device_raw(&args.mac).await?;
                Ok(ToolResponse::ok()
                    .with("mac", args.mac.as_str())
                    .with("details", details))
            })
            .await
    }

    async fn lifecycle(&self, command: Lifecycle, args: ConfirmMacArgs) -> ToolResponse {
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
                let devices = &self.ctx.managers.devices;
                match command {
                    Lifecycle::Reboot => devices.reboot(&args.mac).await?,
                    Lifecycle::Adopt => devices.adopt(&args.mac).await?,
                    Lifecycle::Upgrade => devices.upgrade(&args.mac).await?,
                }
                Ok(ToolResponse::ok()
                    .with("mac", args.mac.as_str())
                    .with("message", command.done(&args.mac)))
            })
            .await
    }

    async fn rename_device(&self, args: RenameArgs) -> ToolResponse {
        self.ctx
            .run(CATEGORY, Action::Update, async {
                if let Some(invalid) = check_mac(&args.mac) {
                    return Ok(invalid);
                }
                if args.name.trim().is_empty() {
                    return Ok(ToolResponse::failure("Name cannot be empty"));
                }
                let warning = format!("This will rename device {} to '{}'", args.mac, args.name);
                let preview = json!({ "mac": args.mac, "name": args.name });
                if let Some(pending) = require_confirm(args.confirm, warning, Some(preview)) {
                    return Ok(pending);
                }
                self.ctx
                    .managers
                    .devices
                    .rename(&args.mac, &args.name)
                    .await?;
                Ok(ToolResponse::ok()
                    .with("mac", args.mac.as_str())
                    .with("name", args.name.as_str())
                    .with("message", format!("Device {} renamed to '{}'", args.mac, args.name)))
            })
            .await
    }
}

impl ToolRegistry for DeviceTools {
    fn tools(&self) -> Vec<Tool> {
        vec![
            make_tool::<NoArgs>(
                "unifi_list_devices",
                "List all UniFi devices (switches, access points, gateways) on the site",
            ),
            make_tool::<MacArgs>(
                "unifi_get_device_details",
                "Get the full controller record of a device by MAC address",
            ),
            make_tool::<ConfirmMacArgs>(
                "unifi_reboot_device",
                "Reboot a device. Requires confirm=true",
            ),
            make_tool::<RenameArgs>(
                "unifi_rename_device",
                "Rename a device. Requires confirm=true",
            ),
            make_tool::<ConfirmMacArgs>(
                "unifi_adopt_device",
                "Adopt a pending device into the site. Requires confirm=true",
            ),
            make_tool::<ConfirmMacArgs>(
                "unifi_upgrade_device",
                "Start a firmware upgrade on a device. Requires confirm=true",
            ),
        ]
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        let tools = self.clone();
        match name {
            "unifi_list_devices" => Some(handle(args, move |_: NoArgs| async move {
                tools.list_devices().await
            })),
            "unifi_get_device_details" => Some(handle(args, move |a: MacArgs| async move {
                tools.get_device_details(a).await
            })),
            "unifi_reboot_device" => Some(handle(args, move |a: ConfirmMacArgs| async move {
                tools.lifecycle(Lifecycle::Reboot, a).await
            })),
            "unifi_adopt_device" => Some(handle(args, move |a: ConfirmMacArgs| async move {
                tools.lifecycle(Lifecycle::Adopt, a).await
            })),
            "unifi_upgrade_device" => Some(handle(args, move |a: ConfirmMacArgs| async move {
                tools.lifecycle(Lifecycle::Upgrade, a).await
            })),
            "unifi_rename_device" => Some(handle(args, move |a: RenameArgs| async move {
                tools.rename_device(a).await
            })),
            _ => None,
        }
    }
}
