//! Tool registries, one per resource family.

pub mod clients;
pub mod common;
pub mod devices;
pub mod dhcp;
pub mod firewall;
pub mod guide;
pub mod health;
pub mod networks;
pub mod switch_ports;
pub mod system;
pub mod traffic_routes;
pub mod wan;

pub use clients::ClientTools;
pub use common::ToolContext;
pub use devices::DeviceTools;
pub use dhcp::DhcpTools;
pub use firewall::FirewallTools;
pub use guide::GuideTools;
pub use health::{HealthResponse, HealthTools, handle_health};
pub use networks::NetworkTools;
pub use switch_ports::SwitchPortTools;
pub use system::SystemTools;
pub use traffic_routes::TrafficRouteTools;
pub use wan::WanTools;

use crate::registry::{CompositeRegistry, ToolRegistry};

/// Every tool the server exposes, `health` first.
pub fn build_registry(
    ctx: ToolContext,
    server_name: impl Into<String>,
    version: impl Into<String>,
) -> CompositeRegistry {
    let site = ctx.managers.site().to_string();
    let domain = CompositeRegistry::new()
        .add(GuideTools)
        .add(DeviceTools::new(ctx.clone()))
        .add(SwitchPortTools::new(ctx.clone()))
        .add(ClientTools::new(ctx.clone()))
        .add(DhcpTools::new(ctx.clone()))
        .add(NetworkTools::new(ctx.clone()))
        .add(WanTools::new(ctx.clone()))
        .add(FirewallTools::new(ctx.clone()))
        .add(TrafficRouteTools::new(ctx.clone()))
        .add(SystemTools::new(ctx));
    let total = domain.tool_count() + 1;
    tracing::debug!(tools = total, site = %site, "tool registry built");
    CompositeRegistry::new()
        .add(HealthTools::new(server_name, version, site, total))
        .add(domain)
}
