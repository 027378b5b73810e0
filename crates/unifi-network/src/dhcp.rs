//! Fixed IP reservations.
//!
//! A reservation is a known client record (`/rest/user`) with
//! `use_fixedip` set. Clients that have never connected can be reserved
//! too: [`DhcpManager::create_dhcp_reservation`] posts a fresh user record.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value, json};
use unifi_client::{ApiRequest, Connection};

use crate::clients::{CACHE_CLIENTS, CACHE_USERS, find_by_mac};
use crate::error::{Error, Result};
use crate::models::{Client, NetworkConf, from_value};
use crate::networks::CACHE_NETWORKS;

/// Upper bound on [`DhcpManager::list_available_ips`] results.
pub const MAX_AVAILABLE_IPS: usize = 50;

/// A fixed IP reservation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Reservation {
    /// Known-client record id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Client MAC.
    pub mac: String,
    /// Alias, else hostname, else `Unknown`.
    pub name: String,
    /// Reserved address.
    pub fixed_ip: Option<String>,
    /// Network of the reservation.
    pub network_id: Option<String>,
    /// Always `true`.
    pub use_fixedip: bool,
    /// Whether the client has a note.
    pub noted: bool,
    /// Whether the client is blocked.
    pub blocked: bool,
    /// Name of `network_id`, when resolvable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_name: Option<String>,
    /// Subnet of `network_id`, when resolvable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_subnet: Option<String>,
}

impl Reservation {
    fn from_client(client: &Client, networks: &[NetworkConf]) -> Self {
        let network = client
            .network_id
            .as_deref()
            .and_then(|id| networks.iter().find(|n| n.id == id));
        Self {
            id: client.id.clone(),
            mac: client.mac.clone(),
            name: client.display_name().to_string(),
            fixed_ip: client.fixed_ip.clone(),
            network_id: client.network_id.clone(),
            use_fixedip: true,
            noted: client.noted,
            blocked: client.blocked,
            network_name: network.map(|n| n.name.clone().unwrap_or_else(|| "Unknown".into())),
            network_subnet: network.map(|n| n.ip_subnet.clone().unwrap_or_default()),
        }
    }
}

/// The network whose subnet contains `ip`.
pub fn detect_network<'a>(networks: &'a [NetworkConf], ip: IpAddr) -> Option<&'a NetworkConf> {
    networks
        .iter()
        .find(|n| n.subnet().is_some_and(|s| s.contains(ip)))
}

/// Addresses in `start..=stop` not in `taken`, at most `limit`.
pub fn free_addresses(
    start: Ipv4Addr,
    stop: Ipv4Addr,
    taken: &HashSet<String>,
    limit: usize,
) -> Vec<String> {
    (u32::from(start)..=u32::from(stop))
        .map(|n| Ipv4Addr::from(n).to_string())
        .filter(|ip| !taken.contains(ip))
        .take(limit)
        .collect()
}

/// Manages DHCP reservations.
#[derive(Clone)]
pub struct DhcpManager {
    conn: Arc<Connection>,
}

impl DhcpManager {
    /// Create a manager over a shared connection.
    pub fn new(conn: Arc<Connection>) -> Self {
        Self { conn }
    }

    async fn networks(&self) -> Result<Vec<NetworkConf>> {
        self.conn
            .cached_list(CACHE_NETWORKS, ApiRequest::get("/rest/networkconf"))
            .await?
            .into_iter()
            .map(from_value)
            .collect()
    }

    async fn known_clients(&self) -> Result<Vec<Value>> {
        Ok(self
            .conn
            .cached_list(CACHE_USERS, ApiRequest::get("/rest/user"))
            .await?)
    }

    async fn known_client(&self, mac: &str) -> Result<Client> {
        let raw = find_by_mac(self.known_clients().await?, mac)
            .ok_or_else(|| Error::not_found("Client", mac))?;
        from_value(raw)
    }

    async fn resolve_network(&self, ip: &str, network_id: Option<&str>) -> Result<String> {
        if let Some(id) = network_id {
            return Ok(id.to_string());
        }
        let addr: IpAddr = ip
            .parse()
            .map_err(|_| Error::validation("Invalid IP address format"))?;
        let networks = self.networks().await?;
        let network = detect_network(&networks, addr).ok_or_else(|| Error::NetworkNotDetected {
            ip: ip.to_string(),
        })?;
        tracing::info!(
            network = network.name.as_deref().unwrap_or(&network.id),
            ip,
            "auto-detected network"
        );
        Ok(network.id.clone())
    }

    /// All reservations, annotated with network name and subnet.
    pub async fn list_dhcp_reservations(&self) -> Result<Vec<Reservation>> {
        let clients: Vec<Client> = self
            .known_clients()
            .await?
            .into_iter()
            .map(from_value)
            .collect::<Result<_>>()?;
        let reserved: Vec<&Client> = clients.iter().filter(|c| c.use_fixedip).collect();
        if reserved.is_empty() {
            return Ok(Vec::new());
        }

        let networks = match self.networks().await {
            Ok(networks) => networks,
            Err(e) => {
                tracing::warn!(error = %e, "could not fetch network info for reservations");
                Vec::new()
            }
        };
        Ok(reserved
            .into_iter()
            .map(|c| Reservation::from_client(c, &networks))
            .collect())
    }

    /// Reserve `ip` for an existing client. The network is detected from
    /// the IP when `network_id` is `None`.
    pub async fn set_client_fixed_ip(
        &self,
        mac: &str,
        ip: &str,
        network_id: Option<&str>,
    ) -> Result<()> {
        let client = self.known_client(mac).await?;
        let network_id = self.resolve_network(ip, network_id).await?;
        self.conn
            .request(ApiRequest::put(
                format!("/rest/user/{}", client.id),
                json!({
                    "_id": client.id,
                    "use_fixedip": true,
                    "fixed_ip": ip,
                    "network_id": network_id,
                }),
            ))
            .await?;
        tracing::info!(mac, ip, "fixed IP set");
        self.conn.invalidate(None);
        Ok(())
    }

    /// Return a client to dynamic addressing.
    pub async fn remove_client_fixed_ip(&self, mac: &str) -> Result<()> {
        let client = self.known_client(mac).await?;
        self.conn
            .request(ApiRequest::put(
                format!("/rest/user/{}", client.id),
                json!({ "_id": client.id, "use_fixedip": false }),
            ))
            .await?;
        tracing::info!(mac, "fixed IP removed");
        self.conn.invalidate(None);
        Ok(())
    }

    /// The client's reservation, or `None` when it uses DHCP or is unknown.
    pub async fn get_client_fixed_ip(&self, mac: &str) -> Result<Option<Value>> {
        let Some(raw) = find_by_mac(self.known_clients().await?, mac) else {
            return Ok(None);
        };
        let client: Client = from_value(raw)?;
        if !client.use_fixedip {
            return Ok(None);
        }
        Ok(Some(json!({
            "_id": client.id,
            "mac": client.mac,
            "name": client.display_name(),
            "fixed_ip": client.fixed_ip,
            "network_id": client.network_id,
            "use_fixedip": true,
        })))
    }

    /// Reserve `ip` for a MAC that may never have connected.
    pub async fn create_dhcp_reservation(
        &self,
        mac: &str,
        ip: &str,
        name: Option<&str>,
        network_id: Option<&str>,
    ) -> Result<()> {
        let network_id = self.resolve_network(ip, network_id).await?;
        self.conn
            .request(ApiRequest::post("/rest/user", reservation_body(mac, ip, name, &network_id)))
            .await?;
        tracing::info!(mac, ip, "DHCP reservation created");
        self.conn.invalidate(None);
        Ok(())
    }

    /// Addresses in the network's DHCP pool that are neither reserved nor
    /// in use, at most [`MAX_AVAILABLE_IPS`].
    pub async fn list_available_ips(&self, network_id: &str) -> Result<Vec<String>> {
        let networks = self.networks().await?;
        let network = networks
            .iter()
            .find(|n| n.id == network_id)
            .ok_or_else(|| Error::not_found("Network", network_id))?;

        if network.ip_subnet.is_none() {
            return Ok(Vec::new());
        }
        let (Some(start), Some(stop)) = (network.dhcpd_start.as_deref(), network.dhcpd_stop.as_deref())
        else {
            return Ok(Vec::new());
        };
        let parse = |s: &str| {
            s.parse::<Ipv4Addr>()
                .map_err(|_| Error::validation(format!("Invalid DHCP range address: {s}")))
        };
        let (start, stop) = (parse(start)?, parse(stop)?);

        let mut taken: HashSet<String> = self
            .list_dhcp_reservations()
            .await?
            .into_iter()
            .filter_map(|r| r.fixed_ip)
            .collect();
        let active = self
            .conn
            .cached_list(CACHE_CLIENTS, ApiRequest::get("/stat/sta"))
            .await?;
        taken.extend(
            active
                .iter()
                .filter_map(|c| c.get("ip").and_then(Value::as_str))
                .map(str::to_string),
        );

        Ok(free_addresses(start, stop, &taken, MAX_AVAILABLE_IPS))
    }
}

fn reservation_body(mac: &str, ip: &str, name: Option<&str>, network_id: &str) -> Value {
    let mut body = Map::new();
    body.insert("mac".into(), json!(mac.to_lowercase()));
    body.insert("use_fixedip".into(), json!(true));
    body.insert("fixed_ip".into(), json!(ip));
    body.insert("network_id".into(), json!(network_id));
    if let Some(name) = name {
        body.insert("name".into(), json!(name));
        body.insert("noted".into(), json!(true));
    }
    Value::Object(body)
}
