//! Device commands and switch-port management.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use unifi_client::{ApiRequest, Connection};
use unifi_core::validate::{PoeMode, mac_eq};

use crate::error::{Error, Result};
use crate::models::{from_value, Device, PortOverride};

const CACHE_DEVICES: &str = "devices";
const CACHE_PORT_PROFILES: &str = "port_profiles";

/// Pause between turning PoE off and back on in [`DeviceManager::restart_poe_port`].
pub const DEFAULT_POE_CYCLE_DELAY: Duration = Duration::from_secs(5);

/// A `/cmd/devmgr` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Reboot the device.
    Restart,
    /// Adopt a pending device.
    Adopt,
    /// Start a firmware upgrade.
    Upgrade,
}

impl DeviceCommand {
    /// Controller command name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceCommand::Restart => "restart",
            DeviceCommand::Adopt => "adopt",
            DeviceCommand::Upgrade => "upgrade",
        }
    }
}

/// One port of a switch with its override applied.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SwitchPort {
    /// Port index.
    pub port_idx: u32,
    /// Effective name.
    pub name: String,
    /// `false` when the override sets `forward: disabled`.
    pub enabled: bool,
    /// Effective PoE mode.
    pub poe_mode: String,
    /// Effective port profile id.
    pub port_profile: Option<String>,
    /// Link speed in Mbps.
    pub speed: Value,
    /// Duplex.
    pub full_duplex: Value,
    /// Received bytes.
    pub rx_bytes: Value,
    /// Transmitted bytes.
    pub tx_bytes: Value,
    /// Whether the port can supply PoE.
    pub port_poe: Value,
    /// PoE draw in watts.
    pub poe_power: Value,
    /// PoE voltage.
    pub poe_voltage: Value,
    /// Link state.
    pub up: Value,
    /// Media type (`GE`, `SFP+`, ...).
    pub media: Value,
}

/// Port table of one switch.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SwitchPorts {
    /// Switch MAC.
    pub device_mac: String,
    /// Switch name.
    pub device_name: String,
    /// Switch model.
    pub device_model: String,
    /// Number of ports.
    pub port_count: usize,
    /// Ports in port-table order.
    pub ports: Vec<SwitchPort>,
}

fn unnamed() -> String {
    "Unnamed".to_string()
}

fn forward_all() -> String {
    "all".to_string()
}

fn default_true() -> bool {
    true
}

/// Summary of a switch port profile (`/rest/portconf`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortProfile {
    /// Profile id.
    #[serde(alias = "_id", default)]
    pub id: Option<String>,
    /// Profile name.
    #[serde(default = "unnamed")]
    pub name: String,
    /// Untagged network.
    #[serde(default)]
    pub native_networkconf_id: Option<String>,
    /// Tagged networks.
    #[serde(default)]
    pub tagged_networkconf_ids: Vec<String>,
    /// Forwarding mode.
    #[serde(default = "forward_all")]
    pub forward: String,
    /// Port isolation.
    #[serde(default)]
    pub isolation: bool,
    /// Broadcast storm control.
    #[serde(default)]
    pub stormctrl_bcast_enabled: bool,
    /// Multicast storm control.
    #[serde(default)]
    pub stormctrl_mcast_enabled: bool,
    /// Unicast storm control.
    #[serde(default)]
    pub stormctrl_ucast_enabled: bool,
    /// LLDP-MED.
    #[serde(default)]
    pub lldpmed_enabled: bool,
    /// Spanning tree.
    #[serde(default = "default_true")]
    pub stp_port_mode: bool,
}

/// Apply `change` to the override for `port_idx`, creating it if absent.
///
/// Other overrides are left untouched.
pub fn apply_port_change<F>(overrides: &mut Vec<PortOverride>, port_idx: u32, change: F)
where
    F: FnOnce(&mut PortOverride),
{
    match overrides.iter_mut().find(|o| o.port_idx == port_idx) {
        Some(existing) => change(existing),
        None => {
            let mut created = PortOverride::new(port_idx);
            change(&mut created);
            overrides.push(created);
        }
    }
}

/// 1-based number printed on the switch for a 0-based `port_idx`.
pub fn port_number(port_idx: u32) -> u32 {
    port_idx.saturating_add(1)
}

/// Manages devices and switch ports.
#[derive(Clone)]
pub struct DeviceManager {
    conn: Arc<Connection>,
}

impl DeviceManager {
    /// Create a manager over a shared connection.
    pub fn new(conn: Arc<Connection>) -> Self {
        Self { conn }
    }

    /// Raw device objects for the site.
    pub async fn list_devices_raw(&self) -> Result<Vec<Value>> {
        Ok(self
            .conn
            .cached_list(CACHE_DEVICES, ApiRequest::get("/stat/device"))
            .await?)
    }

    /// Devices for the site.
    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        self.list_devices_raw()
            .await?
            .into_iter()
            .map(from_value)
            .collect()
    }

    /// Raw device object by MAC (case and separator insensitive).
    pub async fn get_device_raw(&self, mac: &str) -> Result<Value> {
        self.list_devices_raw()
            .await?
            .into_iter()
            .find(|d| d.get("mac").and_then(Value::as_str).is_some_and(|m| mac_eq(m, mac)))
            .ok_or_else(|| Error::not_found("Device", mac))
    }

    /// Device by MAC.
    pub async fn get_device(&self, mac: &str) -> Result<Device> {
        from_value(self.get_device_raw(mac).await?)
    }

    /// Send a `/cmd/devmgr` command.
    pub async fn command(&self, mac: &str, command: DeviceCommand) -> Result<()> {
        self.conn
            .request(ApiRequest::post(
                "/cmd/devmgr",
                json!({ "mac": mac.to_lowercase(), "cmd": command.as_str() }),
            ))
            .await?;
        tracing::info!(mac, cmd = command.as_str(), "device command sent");
        self.conn.invalidate(Some(CACHE_DEVICES));
        Ok(())
    }

    /// Reboot a device.
    pub async fn reboot(&self, mac: &str) -> Result<()> {
        self.command(mac, DeviceCommand::Restart).await
    }

    /// Adopt a pending device.
    pub async fn adopt(&self, mac: &str) -> Result<()> {
        self.command(mac, DeviceCommand::Adopt).await
    }

    /// Start a firmware upgrade.
    pub async fn upgrade(&self, mac: &str) -> Result<()> {
        self.command(mac, DeviceCommand::Upgrade).await
    }

    /// Rename a device.
    pub async fn rename(&self, mac: &str, name: &str) -> Result<()> {
        let device = self.get_device(mac).await?;
        self.conn
            .request(ApiRequest::put(
                format!("/rest/device/{}", device.id),
                json!({ "name": name }),
            ))
            .await?;
        tracing::info!(mac, name, "device renamed");
        self.conn.invalidate(Some(CACHE_DEVICES));
        Ok(())
    }

    /// Current port overrides of a device.
    pub async fn port_overrides(&self, mac: &str) -> Result<Vec<PortOverride>> {
        Ok(self.get_device(mac).await?.port_overrides)
    }

    /// Replace the port overrides of a device.
    pub async fn update_port_overrides(&self, mac: &str, overrides: &[PortOverride]) -> Result<()> {
        let device = self.get_device(mac).await?;
        self.put_overrides(&device, overrides).await
    }

    async fn put_overrides(&self, device: &Device, overrides: &[PortOverride]) -> Result<()> {
        let body = json!({ "port_overrides": serde_json::to_value(overrides).map_err(|e| Error::Core(e.into()))? });
        self.conn
            .request(ApiRequest::put(format!("/rest/device/{}", device.id), body))
            .await?;
        tracing::info!(mac = %device.mac, "port overrides updated");
        self.conn.invalidate(Some(CACHE_DEVICES));
        Ok(())
    }

    async fn modify_port<F>(&self, mac: &str, port_idx: u32, change: F) -> Result<()>
    where
        F: FnOnce(&mut PortOverride),
    {
        let device = self.get_device(mac).await?;
        if !device.is_switch() {
            return Err(Error::NotASwitch {
                mac: mac.to_string(),
            });
        }
        if !device.port_table.iter().any(|p| p.port_idx == port_idx) {
            return Err(Error::not_found("Port", port_number(port_idx).to_string()));
        }
        let mut overrides = device.port_overrides.clone();
        apply_port_change(&mut overrides, port_idx, change);
        self.put_overrides(&device, &overrides).await
    }

    /// Enable or disable a switch port.
    pub async fn toggle_switch_port(&self, mac: &str, port_idx: u32, enabled: bool) -> Result<()> {
        self.modify_port(mac, port_idx, |o| {
            if enabled {
                o.forward = None;
            } else {
                o.forward = Some("disabled".to_string());
            }
        })
        .await
    }

    /// Set the PoE mode of a port.
    pub async fn set_port_poe_mode(&self, mac: &str, port_idx: u32, mode: PoeMode) -> Result<()> {
        self.modify_port(mac, port_idx, |o| o.poe_mode = Some(mode.to_string()))
            .await
    }

    /// Assign a port profile.
    pub async fn set_port_profile(
        &self,
        mac: &str,
        port_idx: u32,
        portconf_id: &str,
    ) -> Result<()> {
        self.modify_port(mac, port_idx, |o| o.portconf_id = Some(portconf_id.to_string()))
            .await
    }

    /// Set a custom port name.
    pub async fn set_port_name(&self, mac: &str, port_idx: u32, name: &str) -> Result<()> {
        self.modify_port(mac, port_idx, |o| o.name = Some(name.to_string()))
            .await
    }

    /// Power-cycle a PoE port: off, wait `delay`, then `auto`.
    pub async fn restart_poe_port(&self, mac: &str, port_idx: u32, delay: Duration) -> Result<()> {
        self.set_port_poe_mode(mac, port_idx, PoeMode::Off).await?;
        tokio::time::sleep(delay).await;
        self.set_port_poe_mode(mac, port_idx, PoeMode::Auto).await?;
        tracing::info!(mac, port = port_number(port_idx), "PoE power cycled");
        Ok(())
    }

    /// Port table of a switch with overrides applied.
    pub async fn list_switch_ports(&self, mac: &str) -> Result<SwitchPorts> {
        let device = self.get_device(mac).await?;
        if !device.is_switch() {
            return Err(Error::NotASwitch {
                mac: mac.to_string(),
            });
        }

        let ports: Vec<SwitchPort> = device
            .port_table
            .iter()
            .map(|port| {
                let idx = port.port_idx;
                let over = device.port_overrides.iter().find(|o| o.port_idx == idx);
                SwitchPort {
                    port_idx: idx,
                    name: over
                        .and_then(|o| o.name.clone())
                        .or_else(|| port.name.clone())
                        .unwrap_or_else(|| format!("Port {}", port_number(idx))),
                    enabled: !over.is_some_and(PortOverride::is_disabled),
                    poe_mode: over
                        .and_then(|o| o.poe_mode.clone())
                        .or_else(|| port.poe_mode.clone())
                        .unwrap_or_else(|| PoeMode::Off.to_string()),
                    port_profile: over
                        .and_then(|o| o.portconf_id.clone())
                        .or_else(|| port.portconf_id.clone()),
                    speed: port.field("speed"),
                    full_duplex: port.field("full_duplex"),
                    rx_bytes: port.field("rx_bytes"),
                    tx_bytes: port.field("tx_bytes"),
                    port_poe: or_default(port.field("port_poe"), Value::Bool(false)),
                    poe_power: or_default(port.field("poe_power"), json!(0)),
                    poe_voltage: or_default(port.field("poe_voltage"), json!(0)),
                    up: or_default(port.field("up"), Value::Bool(false)),
                    media: or_default(port.field("media"), json!("Unknown")),
                }
            })
            .collect();

        Ok(SwitchPorts {
            device_mac: mac.to_string(),
            device_name: device.name.clone().unwrap_or_else(|| "Unknown".into()),
            device_model: device.model.clone().unwrap_or_else(|| "Unknown".into()),
            port_count: ports.len(),
            ports,
        })
    }

    /// Available port profiles.
    pub async fn port_profiles(&self) -> Result<Vec<PortProfile>> {
        self.conn
            .cached_list(CACHE_PORT_PROFILES, ApiRequest::get("/rest/portconf"))
            .await?
            .into_iter()
            .map(from_value)
            .collect()
    }
}

fn or_default(value: Value, default: Value) -> Value {
    if value.is_null() { default } else { value }
}
