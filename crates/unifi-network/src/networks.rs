//! LAN/VLAN networks and wireless networks.
//!
//! Updates are read-modify-write: the stored object is fetched, the
//! changed fields are merged over it, and the full object is PUT back.
//! The controller rejects partial network objects on some versions.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use unifi_client::{ApiRequest, Connection, into_list};
use unifi_core::ResourceValidator;
use unifi_core::schema::{network_create_schema, wlan_create_schema};

use crate::error::{Error, Result};

pub(crate) const CACHE_NETWORKS: &str = "networks";
const CACHE_WLANS: &str = "wlans";

/// Merge `updates` over `existing`, returning the full object.
pub fn merge(existing: &Value, updates: &Map<String, Value>) -> Value {
    let mut merged = existing.as_object().cloned().unwrap_or_default();
    for (key, value) in updates {
        merged.insert(key.clone(), value.clone());
    }
    Value::Object(merged)
}

/// Fill in fields the controller requires when creating a WLAN.
pub fn apply_wlan_defaults(wlan: &mut Map<String, Value>) {
    let defaults = [
        ("usergroup_id", json!("")),
        ("wlangroup_id", json!("")),
        ("hide_ssid", json!(false)),
        ("is_guest", json!(false)),
        ("wpa_mode", json!("wpa2")),
        ("wpa_enc", json!("ccmp")),
        ("uapsd_enabled", json!(false)),
        ("schedule_enabled", json!(false)),
        ("schedule", json!([])),
        // Empty means every access point.
        ("ap_group_ids", json!([])),
    ];
    for (key, value) in defaults {
        wlan.entry(key).or_insert(value);
    }
}

fn is_wan(network: &Value) -> bool {
    network.get("purpose").and_then(Value::as_str) == Some("wan")
}

fn first_created(response: Value) -> Value {
    if response.get("_id").is_some() {
        return response;
    }
    into_list(response).into_iter().next().unwrap_or(Value::Null)
}

fn find_by_id(items: Vec<Value>, id: &str) -> Option<Value> {
    items
        .into_iter()
        .find(|item| item.get("_id").and_then(Value::as_str) == Some(id))
}

/// Manages networks and WLANs.
#[derive(Clone)]
pub struct NetworkManager {
    conn: Arc<Connection>,
}

impl NetworkManager {
    /// Create a manager over a shared connection.
    pub fn new(conn: Arc<Connection>) -> Self {
        Self { conn }
    }

    /// Network configurations (`/rest/networkconf`).
    pub async fn list_networks(&self) -> Result<Vec<Value>> {
        Ok(self
            .conn
            .cached_list(CACHE_NETWORKS, ApiRequest::get("/rest/networkconf"))
            .await?)
    }

    /// One network by id.
    pub async fn get_network(&self, network_id: &str) -> Result<Value> {
        find_by_id(self.list_networks().await?, network_id)
            .ok_or_else(|| Error::not_found("Network", network_id))
    }

    /// Validate a new network without sending it.
    pub fn prepare_network(&self, network: &Value) -> Result<Map<String, Value>> {
        let validator = ResourceValidator::new("Network", &network_create_schema())?;
        Ok(validator.validate(network)?)
    }

    /// Validate and create a network. Returns the created object.
    pub async fn create_network(&self, network: &Value) -> Result<Value> {
        let body = self.prepare_network(network)?;
        let response = self
            .conn
            .request(ApiRequest::post("/rest/networkconf", Value::Object(body)))
            .await?;
        tracing::info!(name = network["name"].as_str().unwrap_or_default(), "network created");
        self.conn.invalidate(Some(CACHE_NETWORKS));
        Ok(first_created(response))
    }

    /// Merge `updates` into a network. Returns the object that was sent.
    pub async fn update_network(
        &self,
        network_id: &str,
        updates: &Map<String, Value>,
    ) -> Result<Value> {
        let existing = self.get_network(network_id).await?;
        if updates.is_empty() {
            return Ok(existing);
        }
        if is_wan(&existing) {
            tracing::warn!(network_id, "modifying WAN network; internet connectivity may be affected");
        }
        let merged = merge(&existing, updates);
        self.conn
            .request(ApiRequest::put(format!("/rest/networkconf/{network_id}"), merged.clone()))
            .await?;
        tracing::info!(network_id, "network updated");
        self.conn.invalidate(Some(CACHE_NETWORKS));
        Ok(merged)
    }

    /// Delete a network.
    pub async fn delete_network(&self, network_id: &str) -> Result<()> {
        let existing = self.get_network(network_id).await?;
        if is_wan(&existing) {
            tracing::warn!(network_id, "deleting WAN network; internet connectivity may be affected");
        }
        self.conn
            .request(ApiRequest::delete(format!("/rest/networkconf/{network_id}")))
            .await?;
        tracing::info!(network_id, "network deleted");
        self.conn.invalidate(Some(CACHE_NETWORKS));
        Ok(())
    }

    /// Wireless networks (`/rest/wlanconf`).
    pub async fn list_wlans(&self) -> Result<Vec<Value>> {
        Ok(self
            .conn
            .cached_list(CACHE_WLANS, ApiRequest::get("/rest/wlanconf"))
            .await?)
    }

    /// One WLAN by id.
    pub async fn get_wlan(&self, wlan_id: &str) -> Result<Value> {
        find_by_id(self.list_wlans().await?, wlan_id).ok_or_else(|| Error::not_found("WLAN", wlan_id))
    }

    /// Validate a new WLAN and apply defaults without sending it.
    pub fn prepare_wlan(&self, wlan: &Value) -> Result<Map<String, Value>> {
        let validator = ResourceValidator::new("WLAN", &wlan_create_schema())?;
        let mut body = validator.validate(wlan)?;
        apply_wlan_defaults(&mut body);
        Ok(body)
    }

    /// Validate, apply defaults, and create a WLAN.
    pub async fn create_wlan(&self, wlan: &Value) -> Result<Value> {
        let body = self.prepare_wlan(wlan)?;
        let response = self
            .conn
            .request(ApiRequest::post("/rest/wlanconf", Value::Object(body)))
            .await?;
        tracing::info!(name = wlan["name"].as_str().unwrap_or_default(), "WLAN created");
        self.conn.invalidate(Some(CACHE_WLANS));
        Ok(first_created(response))
    }

    /// Merge `updates` into a WLAN. Returns the object that was sent.
    pub async fn update_wlan(&self, wlan_id: &str, updates: &Map<String, Value>) -> Result<Value> {
        let existing = self.get_wlan(wlan_id).await?;
        if updates.is_empty() {
            return Ok(existing);
        }
        let merged = merge(&existing, updates);
        self.conn
            .request(ApiRequest::put(format!("/rest/wlanconf/{wlan_id}"), merged.clone()))
            .await?;
        tracing::info!(wlan_id, "WLAN updated");
        self.conn.invalidate(Some(CACHE_WLANS));
        Ok(merged)
    }

    /// Flip a WLAN's `enabled` flag. Returns the new state.
    pub async fn toggle_wlan(&self, wlan_id: &str) -> Result<bool> {
        let existing = self.get_wlan(wlan_id).await?;
        let enabled = !existing.get("enabled").and_then(Value::as_bool).unwrap_or(false);
        self.conn
            .request(ApiRequest::put(
                format!("/rest/wlanconf/{wlan_id}"),
                json!({ "enabled": enabled }),
            ))
            .await?;
        tracing::info!(wlan_id, enabled, "WLAN toggled");
        self.conn.invalidate(Some(CACHE_WLANS));
        Ok(enabled)
    }

    /// Delete a WLAN.
    pub async fn delete_wlan(&self, wlan_id: &str) -> Result<()> {
        self.conn
            .request(ApiRequest::delete(format!("/rest/wlanconf/{wlan_id}")))
            .await?;
        tracing::info!(wlan_id, "WLAN deleted");
        self.conn.invalidate(Some(CACHE_WLANS));
        Ok(())
    }
}
