//! Typed views over controller objects.
//!
//! Controller objects carry far more fields than the managers compute on.
//! Each model names the fields it needs and keeps the rest in `extra`, so
//! a read-modify-write cycle sends back everything the controller gave us.

use std::net::IpAddr;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Device types that expose a switch port table.
pub const SWITCH_TYPES: [&str; 3] = ["usw", "usl", "usf"];

/// Device types that act as the site gateway.
pub const GATEWAY_TYPES: [&str; 4] = ["ugw", "udm", "uxg", "udmp"];

/// Parse a controller object into a typed view.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::Core(e.into()))
}

/// An adopted (or pending) UniFi device.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Controller object id.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// MAC address.
    #[serde(default)]
    pub mac: String,
    /// Device family (`usw`, `uap`, `udm`, ...).
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Hardware model code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// User-assigned name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Live port status (switches only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_table: Vec<PortStatus>,
    /// Per-port configuration overrides (switches only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub port_overrides: Vec<PortOverride>,
    /// Primary WAN interface (gateways only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wan1: Option<Value>,
    /// Secondary WAN interface (gateways only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wan2: Option<Value>,
    /// All other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    /// Whether the device has a switch port table.
    pub fn is_switch(&self) -> bool {
        SWITCH_TYPES.contains(&self.kind.as_str())
    }

    /// Whether the device is a gateway.
    pub fn is_gateway(&self) -> bool {
        GATEWAY_TYPES.contains(&self.kind.as_str())
    }
}

/// Configuration override for one switch port.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PortOverride {
    /// Port index.
    pub port_idx: u32,
    /// Custom port name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Forwarding mode; `disabled` turns the port off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward: Option<String>,
    /// PoE mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poe_mode: Option<String>,
    /// Assigned port profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portconf_id: Option<String>,
    /// All other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PortOverride {
    /// Empty override for `port_idx`.
    pub fn new(port_idx: u32) -> Self {
        Self {
            port_idx,
            ..Default::default()
        }
    }

    /// Whether this override disables the port.
    pub fn is_disabled(&self) -> bool {
        self.forward.as_deref() == Some("disabled")
    }
}

/// Live status of one switch port.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PortStatus {
    /// Port index.
    #[serde(default)]
    pub port_idx: u32,
    /// Name reported by the switch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// PoE mode reported by the switch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poe_mode: Option<String>,
    /// Profile reported by the switch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portconf_id: Option<String>,
    /// All other fields (speed, counters, PoE readings, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PortStatus {
    /// A field from the raw status, or `null`.
    pub fn field(&self, key: &str) -> Value {
        self.extra.get(key).cloned().unwrap_or(Value::Null)
    }
}

/// A client known to the controller (`/rest/user`) or currently
/// connected (`/stat/sta`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Controller object id.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// MAC address.
    #[serde(default)]
    pub mac: String,
    /// User-assigned alias.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Hostname reported over DHCP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Current IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Whether a fixed IP is reserved.
    #[serde(default)]
    pub use_fixedip: bool,
    /// Reserved IP address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_ip: Option<String>,
    /// Network the reservation belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    /// Whether the client is blocked.
    #[serde(default)]
    pub blocked: bool,
    /// Whether the client has a user note/alias.
    #[serde(default)]
    pub noted: bool,
    /// All other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Client {
    /// Alias, else hostname, else `Unknown`.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.hostname.as_deref())
            .unwrap_or("Unknown")
    }
}

/// A LAN, VLAN, or WAN network configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConf {
    /// Controller object id.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Network name.
    #[serde(default)]
    pub name: Option<String>,
    /// `corporate`, `guest`, `wan`, `vlan-only`, ...
    #[serde(default)]
    pub purpose: Option<String>,
    /// Gateway address and prefix, e.g. `192.168.1.1/24`.
    #[serde(default)]
    pub ip_subnet: Option<String>,
    /// First address of the DHCP pool.
    #[serde(default)]
    pub dhcpd_start: Option<String>,
    /// Last address of the DHCP pool.
    #[serde(default)]
    pub dhcpd_stop: Option<String>,
    /// All other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NetworkConf {
    /// Whether this is the WAN network.
    pub fn is_wan(&self) -> bool {
        self.purpose.as_deref() == Some("wan")
    }

    /// Parsed subnet, when configured and valid.
    pub fn subnet(&self) -> Option<Subnet> {
        self.ip_subnet.as_deref().and_then(|s| s.parse().ok())
    }
}

/// An address with a prefix length. Host bits may be set, as in the
/// controller's `ip_subnet` (`192.168.1.1/24`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subnet {
    addr: IpAddr,
    prefix: u8,
}

impl Subnet {
    /// Whether `ip` falls inside this subnet. Address families must match.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = prefix_mask(self.prefix, 32) as u32;
                (u32::from(net) & mask) == (u32::from(ip) & mask)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = prefix_mask(self.prefix, 128);
                (u128::from(net) & mask) == (u128::from(ip) & mask)
            }
            _ => false,
        }
    }
}

fn prefix_mask(prefix: u8, bits: u32) -> u128 {
    let prefix = u32::from(prefix).min(bits);
    if prefix == 0 {
        return 0;
    }
    let all = if bits == 128 { u128::MAX } else { (1u128 << bits) - 1 };
    all & !((1u128 << (bits - prefix)) - 1)
}

impl FromStr for Subnet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::validation(format!("Invalid subnet: {s}"));
        let (addr, prefix) = s.split_once('/').ok_or_else(invalid)?;
        let addr: IpAddr = addr.trim().parse().map_err(|_| invalid())?;
        let prefix: u8 = prefix.trim().parse().map_err(|_| invalid())?;
        let max = if addr.is_ipv4() { 32 } else { 128 };
        if prefix > max {
            return Err(invalid());
        }
        Ok(Self { addr, prefix })
    }
}
