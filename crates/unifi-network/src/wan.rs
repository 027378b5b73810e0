//! Read-only WAN status.
//!
//! Nothing here writes to the controller. WAN changes can cut the
//! controller off from the assistant that made them, so they are left to
//! the web UI.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use unifi_client::{ApiRequest, Connection};

use crate::devices::DeviceManager;
use crate::error::{Error, Result};
use crate::models::Device;
use crate::networks::NetworkManager;
use crate::system::{SystemManager, subsystem};

/// Default load-balancing weight for each uplink.
pub const DEFAULT_WAN_WEIGHT: u64 = 50;

/// One WAN uplink of the gateway.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WanInterface {
    /// `wan1` or `wan2`.
    pub name: String,
    /// Address.
    pub ip: Value,
    /// Netmask.
    pub netmask: Value,
    /// Upstream gateway.
    pub gateway: Value,
    /// DNS servers.
    pub dns: Value,
    /// `dhcp`, `static`, `pppoe`, or `disabled`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the uplink is enabled.
    pub enabled: bool,
    /// Seconds since the link came up.
    pub uptime: Option<u64>,
}

impl WanInterface {
    fn from_port(
        name: &str,
        port: Option<&Value>,
        default_type: &str,
        default_enabled: bool,
    ) -> Self {
        let empty = Value::Null;
        let port = port.unwrap_or(&empty);
        let field = |key: &str| port.get(key).cloned().unwrap_or(Value::Null);
        Self {
            name: name.to_string(),
            ip: field("ip"),
            netmask: field("netmask"),
            gateway: field("gateway"),
            dns: field("dns"),
            kind: port
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or(default_type)
                .to_string(),
            enabled: port
                .get("enable")
                .and_then(Value::as_bool)
                .unwrap_or(default_enabled),
            uptime: port.get("uptime").and_then(Value::as_u64),
        }
    }

    fn is_up(&self) -> bool {
        self.uptime.is_some_and(|u| u > 0)
    }
}

/// WAN configuration of the site.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WanConfiguration {
    /// `gateway_device` or `health` (integrated controllers).
    pub source: &'static str,
    /// Gateway MAC.
    pub gateway_mac: Option<String>,
    /// Gateway model.
    pub gateway_model: Option<String>,
    /// Uplinks reported by the gateway.
    pub wan_interfaces: Vec<WanInterface>,
    /// The `purpose: wan` network.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wan_network: Option<Value>,
    /// Health `wan` subsystem, when the gateway is the controller itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wan_health: Option<Value>,
}

/// Dual-WAN behaviour.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailoverSettings {
    /// Secondary uplink takes over when the primary fails.
    pub failover_enabled: bool,
    /// Traffic is split across uplinks by weight.
    pub load_balance_enabled: bool,
    /// Weight of `wan1`.
    pub wan1_weight: u64,
    /// Weight of `wan2`.
    pub wan2_weight: u64,
}

impl FailoverSettings {
    /// Interpret a `connectivity` settings object.
    pub fn from_setting(setting: &Value) -> Self {
        let uplink_type = setting
            .get("uplink_type")
            .and_then(Value::as_str)
            .unwrap_or("failover");
        let weight = |key: &str| {
            setting
                .get(key)
                .and_then(Value::as_u64)
                .unwrap_or(DEFAULT_WAN_WEIGHT)
        };
        Self {
            failover_enabled: uplink_type == "failover",
            load_balance_enabled: uplink_type == "weighted",
            wan1_weight: weight("wan1_weight"),
            wan2_weight: weight("wan2_weight"),
        }
    }
}

/// WAN view for controllers that run on the gateway itself.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DreamMachineStatus {
    /// Whether the controller reports a Dream Machine class device.
    pub is_dream_machine: bool,
    /// Controller, health, port profile, and uplink data.
    pub data: Value,
}

/// Summary of WAN reachability.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ConnectivityReport {
    /// `wan1` is enabled.
    pub wan1_configured: bool,
    /// `wan2` is enabled.
    pub wan2_configured: bool,
    /// First uplink with a positive uptime, `wan1` first.
    pub active_wan: Option<String>,
    /// `wan1` address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wan1_ip: Option<Value>,
    /// `wan1` connection type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wan1_type: Option<String>,
    /// `wan2` address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wan2_ip: Option<Value>,
    /// `wan2` connection type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wan2_type: Option<String>,
    /// Health `wan` subsystem status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wan_health_status: Option<String>,
    /// Whether that status is `ok`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wan_health_ok: Option<bool>,
}

impl ConnectivityReport {
    /// Summarize interfaces and the health `wan` entry.
    pub fn summarize(interfaces: &[WanInterface], wan_health: Option<&Value>) -> Self {
        let mut report = Self::default();
        for iface in interfaces {
            match iface.name.as_str() {
                "wan1" => {
                    report.wan1_configured = iface.enabled;
                    report.wan1_ip = Some(iface.ip.clone());
                    report.wan1_type = Some(iface.kind.clone());
                }
                "wan2" => {
                    report.wan2_configured = iface.enabled;
                    report.wan2_ip = Some(iface.ip.clone());
                    report.wan2_type = Some(iface.kind.clone());
                }
                _ => {}
            }
        }
        report.active_wan = ["wan1", "wan2"]
            .into_iter()
            .find(|name| interfaces.iter().any(|i| i.name == *name && i.is_up()))
            .map(str::to_string);
        if let Some(status) = wan_health.and_then(|h| h.get("status")).and_then(Value::as_str) {
            report.wan_health_status = Some(status.to_string());
            report.wan_health_ok = Some(status == "ok");
        }
        report
    }
}

fn looks_like_dream_machine(sysinfo: &Value) -> bool {
    let device_type = sysinfo
        .get("ubnt_device_type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_ascii_uppercase();
    sysinfo.get("udm_version").is_some()
        || ["UDM", "UDR", "UXG", "UCG"]
            .iter()
            .any(|prefix| device_type.starts_with(prefix))
}

/// Reads WAN configuration and status.
#[derive(Clone)]
pub struct WanManager {
    conn: Arc<Connection>,
    devices: DeviceManager,
    networks: NetworkManager,
    system: SystemManager,
}

impl WanManager {
    /// Create a manager over a shared connection.
    pub fn new(conn: Arc<Connection>) -> Self {
        Self {
            devices: DeviceManager::new(conn.clone()),
            networks: NetworkManager::new(conn.clone()),
            system: SystemManager::new(conn.clone()),
            conn,
        }
    }

    async fn wan_network(&self) -> Result<Option<Value>> {
        let network = self
            .networks
            .list_networks()
            .await?
            .into_iter()
            .find(|n| n.get("purpose").and_then(Value::as_str) == Some("wan"));
        Ok(network.map(|n| {
            let field = |key: &str| n.get(key).cloned().unwrap_or(Value::Null);
            json!({
                "_id": field("_id"),
                "name": field("name"),
                "wan_type": n.get("wan_type").cloned().unwrap_or_else(|| json!("dhcp")),
                "wan_ip": field("wan_ip"),
                "wan_netmask": field("wan_netmask"),
                "wan_gateway": field("wan_gateway"),
                "wan_dns1": field("wan_dns1"),
                "wan_dns2": field("wan_dns2"),
                "wan_dhcp_options": n.get("wan_dhcp_options").cloned().unwrap_or_else(|| json!([])),
            })
        }))
    }

    /// Gateway uplinks and the WAN network. Falls back to the health
    /// `wan` subsystem when no gateway is adopted as a device.
    pub async fn get_wan_configuration(&self) -> Result<WanConfiguration> {
        let devices = self.devices.list_devices().await?;
        let wan_network = self.wan_network().await?;

        if let Some(gateway) = devices.iter().find(|d| d.is_gateway()) {
            return Ok(Self::from_gateway(gateway, wan_network));
        }

        let health = self.system.health().await?;
        let wan_health = subsystem(&health, "wan").cloned().ok_or(Error::NoGateway)?;
        tracing::debug!("no gateway device; using health wan subsystem");
        let str_field = |key: &str| wan_health.get(key).and_then(Value::as_str).map(str::to_string);
        Ok(WanConfiguration {
            source: "health",
            gateway_mac: str_field("gw_mac"),
            gateway_model: str_field("gw_name"),
            wan_interfaces: Vec::new(),
            wan_network,
            wan_health: Some(wan_health),
        })
    }

    fn from_gateway(gateway: &Device, wan_network: Option<Value>) -> WanConfiguration {
        WanConfiguration {
            source: "gateway_device",
            gateway_mac: Some(gateway.mac.clone()),
            gateway_model: gateway.model.clone(),
            wan_interfaces: vec![
                WanInterface::from_port("wan1", gateway.wan1.as_ref(), "dhcp", true),
                WanInterface::from_port("wan2", gateway.wan2.as_ref(), "disabled", false),
            ],
            wan_network,
            wan_health: None,
        }
    }

    /// Failover and load-balancing settings.
    pub async fn get_wan_failover_settings(&self) -> Result<FailoverSettings> {
        let settings = self
            .conn
            .request_list(ApiRequest::get("/get/setting/connectivity"))
            .await?;
        let setting = settings.first().ok_or(Error::NoConnectivitySettings)?;
        Ok(FailoverSettings::from_setting(setting))
    }

    /// WAN view assembled from sysinfo, health, port profiles, and uplink
    /// settings. Port profiles and uplink settings are optional.
    pub async fn get_dream_machine_wan_status(&self) -> Result<DreamMachineStatus> {
        let sysinfo = self.system.sysinfo().await?;
        let health = self.system.health().await?;

        let port_configs = match self.devices.port_profiles().await {
            Ok(profiles) => serde_json::to_value(profiles).unwrap_or(Value::Null),
            Err(e) => {
                tracing::debug!(error = %e, "port profiles unavailable");
                Value::Null
            }
        };
        let uplink_settings = match self.get_wan_failover_settings().await {
            Ok(settings) => serde_json::to_value(settings).unwrap_or(Value::Null),
            Err(e) => {
                tracing::debug!(error = %e, "uplink settings unavailable");
                Value::Null
            }
        };

        let field = |key: &str| sysinfo.get(key).cloned().unwrap_or(Value::Null);
        Ok(DreamMachineStatus {
            is_dream_machine: looks_like_dream_machine(&sysinfo),
            data: json!({
                "controller": {
                    "model": field("ubnt_device_type"),
                    "version": field("version"),
                    "hostname": field("hostname"),
                    "mac": field("mac"),
                },
                "health": subsystem(&health, "wan").cloned().unwrap_or(Value::Null),
                "port_configs": port_configs,
                "uplink_settings": uplink_settings,
            }),
        })
    }

    /// Which uplinks are configured and up, plus WAN health.
    pub async fn check_wan_connectivity(&self) -> Result<ConnectivityReport> {
        let config = self.get_wan_configuration().await?;
        let health = match self.system.health().await {
            Ok(health) => health,
            Err(e) => {
                tracing::warn!(error = %e, "health unavailable for connectivity check");
                Vec::new()
            }
        };
        Ok(ConnectivityReport::summarize(
            &config.wan_interfaces,
            subsystem(&health, "wan"),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;
    use unifi_client::MockController;

    fn manager(mock: &Arc<MockController>) -> WanManager {
        WanManager::new(Arc::new(Connection::new(mock.clone(), Duration::from_secs(60))))
    }

    #[test]
    fn test_failover_defaults() {
        let settings = FailoverSettings::from_setting(&json!({"key": "connectivity"}));
        assert!(settings.failover_enabled);
        assert!(!settings.load_balance_enabled);
        assert_eq!(settings.wan1_weight, 50);

        let weighted = FailoverSettings::from_setting(&json!({"uplink_type": "weighted", "wan1_weight": 70}));
        assert!(!weighted.failover_enabled);
        assert!(weighted.load_balance_enabled);
        assert_eq!(weighted.wan1_weight, 70);
        assert_eq!(weighted.wan2_weight, 50);
    }

    #[test]
    fn test_interface_defaults() {
        let wan2 = WanInterface::from_port("wan2", None, "disabled", false);
        assert_eq!(wan2.kind, "disabled");
        assert!(!wan2.enabled);
        let wan1 = WanInterface::from_port("wan1", Some(&json!({"ip": "203.0.113.10"})), "dhcp", true);
        assert_eq!(wan1.kind, "dhcp");
        assert!(wan1.enabled);
    }

    #[test]
    fn test_active_wan_prefers_wan1() {
        let up = |name: &str, uptime: u64| WanInterface {
            uptime: Some(uptime),
            ..WanInterface::from_port(name, None, "dhcp", true)
        };
        let report = ConnectivityReport::summarize(&[up("wan1", 0), up("wan2", 30)], None);
        assert_eq!(report.active_wan.as_deref(), Some("wan2"));
        let report = ConnectivityReport::summarize(&[up("wan1", 10), up("wan2", 30)], None);
        assert_eq!(report.active_wan.as_deref(), Some("wan1"));
        let report = ConnectivityReport::summarize(&[], Some(&json!({"status": "ok"})));
        assert!(report.active_wan.is_none());
        assert_eq!(report.wan_health_ok, Some(true));
    }

    #[test]
    fn test_dream_machine_detection() {
        assert!(looks_like_dream_machine(&json!({"ubnt_device_type": "UDMPRO"})));
        assert!(looks_like_dream_machine(&json!({"udm_version": "3.2.7"})));
        assert!(!looks_like_dream_machine(&json!({"version": "8.0.26"})));
    }

    #[tokio::test]
    async fn test_configuration_from_gateway() {
        let mock = Arc::new(MockController::new());
        mock.respond_get(
            "/stat/device",
            json!([
                {"_id": "s1", "mac": "aa:aa:aa:aa:aa:01", "type": "usw"},
                {"_id": "g1", "mac": "aa:aa:aa:aa:aa:02", "type": "udm", "model": "UDMPRO",
                 "wan1": {"ip": "203.0.113.10", "type": "static", "enable": true, "uptime": 900}}
            ]),
        );
        mock.respond_get(
            "/rest/networkconf",
            json!([{"_id": "w", "name": "Internet", "purpose": "wan"}]),
        );
        let config = manager(&mock).get_wan_configuration().await.unwrap();
        assert_eq!(config.source, "gateway_device");
        assert_eq!(config.gateway_model.as_deref(), Some("UDMPRO"));
        assert_eq!(config.wan_interfaces[0].kind, "static");
        assert_eq!(config.wan_interfaces[1].kind, "disabled");
        let network = config.wan_network.unwrap();
        assert_eq!(network["wan_type"], "dhcp");
        assert_eq!(network["wan_dhcp_options"], json!([]));
    }

    #[tokio::test]
    async fn test_configuration_falls_back_to_health() {
        let mock = Arc::new(MockController::new());
        mock.respond_get("/stat/device", json!([]));
        mock.respond_get("/rest/networkconf", json!([]));
        mock.respond_get(
            "/stat/health",
            json!([{"subsystem": "wan", "status": "ok", "wan_ip": "198.51.100.4", "gw_mac": "aa:aa:aa:aa:aa:09"}]),
        );
        let config = manager(&mock).get_wan_configuration().await.unwrap();
        assert_eq!(config.source, "health");
        assert_eq!(config.gateway_mac.as_deref(), Some("aa:aa:aa:aa:aa:09"));
        assert_eq!(config.wan_health.unwrap()["wan_ip"], "198.51.100.4");
    }

    #[tokio::test]
    async fn test_no_gateway_and_no_health() {
        let mock = Arc::new(MockController::new());
        mock.respond_get("/stat/device", json!([]));
        mock.respond_get("/rest/networkconf", json!([]));
        mock.respond_get("/stat/health", json!([{"subsystem": "lan", "status": "ok"}]));
        let err = manager(&mock).get_wan_configuration().await.unwrap_err();
        assert!(matches!(err, Error::NoGateway));
    }

    #[tokio::test]
    async fn test_missing_connectivity_settings() {
        let mock = Arc::new(MockController::new());
        mock.respond_get("/get/setting/connectivity", json!([]));
        let err = manager(&mock).get_wan_failover_settings().await.unwrap_err();
        assert_eq!(err.to_string(), "No connectivity settings found");
    }

    #[tokio::test]
    async fn test_check_connectivity_never_writes() {
        let mock = Arc::new(MockController::new());
        mock.respond_get(
            "/stat/device",
            json!([{"_id": "g1", "mac": "aa:aa:aa:aa:aa:02", "type": "ugw",
                    "wan1": {"uptime": 100}, "wan2": {"enable": true, "uptime": 50}}]),
        );
        mock.respond_get("/rest/networkconf", json!([]));
        mock.respond_get("/stat/health", json!([{"subsystem": "wan", "status": "error"}]));
        let report = manager(&mock).check_wan_connectivity().await.unwrap();
        assert!(report.wan1_configured);
        assert!(report.wan2_configured);
        assert_eq!(report.active_wan.as_deref(), Some("wan1"));
        assert_eq!(report.wan_health_ok, Some(false));
        assert!(mock.mutating_requests().is_empty());
    }
}
