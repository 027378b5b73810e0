//! JSON Schema validation for controller payloads.
//!
//! Update and create payloads are checked against a schema before they
//! are merged into controller objects. Update schemas reject unknown keys.

use jsonschema::Validator;
use serde_json::{Map, Value, json};

use crate::error::{Error, Result};

/// Validates a payload for one kind of controller resource.
pub struct ResourceValidator {
    resource_name: &'static str,
    validator: Validator,
}

impl ResourceValidator {
    /// Compile a schema for the named resource.
    pub fn new(resource_name: &'static str, schema: &Value) -> Result<Self> {
        let validator = jsonschema::validator_for(schema).map_err(|e| {
            Error::config(format!("invalid {resource_name} schema: {e}"))
        })?;
        Ok(Self {
            resource_name,
            validator,
        })
    }

    /// Name used in error messages.
    pub fn resource_name(&self) -> &'static str {
        self.resource_name
    }

    /// Validate `params`, returning the payload as an object map.
    pub fn validate(&self, params: &Value) -> Result<Map<String, Value>> {
        if let Some(err) = self.validator.iter_errors(params).next() {
            tracing::warn!(resource = self.resource_name, error = %err, "payload validation failed");
            return Err(Error::validation(format!(
                "{} validation error: {err}",
                self.resource_name
            )));
        }
        match params {
            Value::Object(map) => Ok(map.clone()),
            _ => Err(Error::validation(format!(
                "{} payload must be a JSON object",
                self.resource_name
            ))),
        }
    }
}

/// Schema for partial firewall policy updates.
pub fn firewall_policy_update_schema() -> Value {
    json!({
        "type": "object",
        "minProperties": 1,
        "additionalProperties": false,
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "description": { "type": "string" },
            "enabled": { "type": "boolean" },
            "action": { "type": "string", "enum": ["accept", "drop", "reject", "ALLOW", "BLOCK", "REJECT"] },
            "ruleset": { "type": "string" },
            "index": { "type": "integer", "minimum": 0 },
            "rule_index": { "type": "integer", "minimum": 0 },
            "protocol": { "type": "string" },
            "logging": { "type": "boolean" },
            "ip_version": { "type": "string", "enum": ["ipv4", "ipv6", "both", "BOTH", "IPV4", "IPV6"] },
            "connection_state_type": { "type": "string" },
            "connection_states": { "type": "array", "items": { "type": "string" } },
            "src_address": { "type": "string" },
            "dst_address": { "type": "string" },
            "src_port": { "type": "string" },
            "dst_port": { "type": "string" },
            "state_new": { "type": "boolean" },
            "state_established": { "type": "boolean" },
            "state_related": { "type": "boolean" },
            "state_invalid": { "type": "boolean" },
            "source": { "type": "object" },
            "destination": { "type": "object" },
            "schedule": { "type": "object" }
        }
    })
}

/// Schema for creating a traffic route.
pub fn traffic_route_create_schema() -> Value {
    json!({
        "type": "object",
        "required": ["description", "matching_target", "network_id", "target_devices"],
        "properties": {
            "description": { "type": "string", "minLength": 1 },
            "enabled": { "type": "boolean" },
            "matching_target": { "type": "string", "enum": ["INTERNET", "DOMAIN", "IP", "REGION"] },
            "network_id": { "type": "string", "minLength": 1 },
            "next_hop": { "type": "string" },
            "kill_switch_enabled": { "type": "boolean" },
            "domains": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["domain"],
                    "properties": {
                        "domain": { "type": "string" },
                        "port_ranges": { "type": "array" },
                        "ports": { "type": "array" }
                    }
                }
            },
            "ip_addresses": { "type": "array" },
            "ip_ranges": { "type": "array" },
            "regions": { "type": "array", "items": { "type": "string" } },
            "target_devices": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["type"],
                    "properties": {
                        "type": { "type": "string", "enum": ["CLIENT", "NETWORK", "ALL_CLIENTS"] },
                        "client_mac": { "type": "string" },
                        "network_id": { "type": "string" }
                    }
                }
            }
        }
    })
}

/// Schema for partial traffic route updates.
pub fn traffic_route_update_schema() -> Value {
    json!({
        "type": "object",
        "minProperties": 1,
        "additionalProperties": false,
        "properties": {
            "description": { "type": "string", "minLength": 1 },
            "enabled": { "type": "boolean" },
            "matching_target": { "type": "string", "enum": ["INTERNET", "DOMAIN", "IP", "REGION"] },
            "network_id": { "type": "string" },
            "next_hop": { "type": "string" },
            "kill_switch_enabled": { "type": "boolean" },
            "domains": { "type": "array" },
            "ip_addresses": { "type": "array" },
            "ip_ranges": { "type": "array" },
            "regions": { "type": "array" },
            "target_devices": { "type": "array" }
        }
    })
}

/// Schema for creating a LAN/VLAN network.
pub fn network_create_schema() -> Value {
    json!({
        "type": "object",
        "required": ["name", "purpose"],
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "purpose": { "type": "string", "enum": ["corporate", "guest", "vlan-only", "wan", "remote-user-vpn", "site-vpn"] },
            "vlan_enabled": { "type": "boolean" },
            "vlan": { "type": ["integer", "string"] },
            "ip_subnet": { "type": "string" },
            "dhcpd_enabled": { "type": "boolean" },
            "dhcpd_start": { "type": "string" },
            "dhcpd_stop": { "type": "string" },
            "network_isolation_enabled": { "type": "boolean" },
            "enabled": { "type": "boolean" }
        }
    })
}

/// Schema for creating a wireless network.
pub fn wlan_create_schema() -> Value {
    json!({
        "type": "object",
        "required": ["name", "security", "enabled"],
        "properties": {
            "name": { "type": "string", "minLength": 1, "maxLength": 32 },
            "security": { "type": "string", "enum": ["open", "wpapsk", "wep", "wpaeap", "osen"] },
            "enabled": { "type": "boolean" },
            "x_passphrase": { "type": "string", "minLength": 8, "maxLength": 63 },
            "networkconf_id": { "type": "string" },
            "hide_ssid": { "type": "boolean" },
            "is_guest": { "type": "boolean" },
            "wpa_mode": { "type": "string" },
            "wpa_enc": { "type": "string" }
        },
        "if": { "properties": { "security": { "not": { "const": "open" } } } },
        "then": { "required": ["x_passphrase"] }
    })
}
