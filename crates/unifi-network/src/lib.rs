#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! UniFi Network Resource Managers
//!
//! One manager per resource family, all sharing a single
//! [`Connection`](unifi_client::Connection). Managers return typed
//! results and leave presentation (JSON envelopes, confirmation prompts,
//! permissions) to the MCP layer.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use unifi_client::{Connection, MockController};
//! use unifi_network::Managers;
//!
//! let conn = Arc::new(Connection::new(Arc::new(MockController::new()), Duration::from_secs(10)));
//! let managers = Managers::new(conn);
//! # let _ = managers;
//! ```

pub mod clients;
pub mod devices;
pub mod dhcp;
pub mod error;
pub mod firewall;
pub mod models;
pub mod networks;
pub mod system;
pub mod traffic_routes;
pub mod wan;

use std::sync::Arc;

use unifi_client::Connection;

// Re-exports
pub use clients::{ClientCommand, ClientManager};
pub use devices::{
    DEFAULT_POE_CYCLE_DELAY, DeviceCommand, DeviceManager, PortProfile, SwitchPort, SwitchPorts,
    port_number,
};
pub use dhcp::{DhcpManager, MAX_AVAILABLE_IPS, Reservation};
pub use error::{Error, Result};
pub use firewall::{CreationStyle, FirewallManager, PolicySummary};
pub use models::{Client, Device, NetworkConf, PortOverride, Subnet};
pub use networks::NetworkManager;
pub use system::SystemManager;
pub use traffic_routes::TrafficRouteManager;
pub use wan::{
    ConnectivityReport, DreamMachineStatus, FailoverSettings, WanConfiguration, WanManager,
};

/// Every manager, built over one shared connection.
#[derive(Clone)]
pub struct Managers {
    /// Shared connection.
    pub conn: Arc<Connection>,
    /// Devices and switch ports.
    pub devices: DeviceManager,
    /// Clients.
    pub clients: ClientManager,
    /// DHCP reservations.
    pub dhcp: DhcpManager,
    /// Networks and WLANs.
    pub networks: NetworkManager,
    /// WAN status.
    pub wan: WanManager,
    /// Firewall policies.
    pub firewall: FirewallManager,
    /// Traffic routes.
    pub traffic_routes: TrafficRouteManager,
    /// Health and sysinfo.
    pub system: SystemManager,
}

impl Managers {
    /// Build every manager over `conn`.
    pub fn new(conn: Arc<Connection>) -> Self {
        Self {
            devices: DeviceManager::new(conn.clone()),
            clients: ClientManager::new(conn.clone()),
            dhcp: DhcpManager::new(conn.clone()),
            networks: NetworkManager::new(conn.clone()),
            wan: WanManager::new(conn.clone()),
            firewall: FirewallManager::new(conn.clone()),
            traffic_routes: TrafficRouteManager::new(conn.clone()),
            system: SystemManager::new(conn.clone()),
            conn,
        }
    }

    /// Site every manager is scoped to.
    pub fn site(&self) -> &str {
        self.conn.site()
    }
}
