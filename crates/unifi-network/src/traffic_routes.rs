//! Policy-based traffic routes (V2 `/trafficroutes`).

use std::sync::Arc;

use serde_json::{Map, Value, json};
use unifi_client::{ApiRequest, Connection, into_list};
use unifi_core::ResourceValidator;
use unifi_core::schema::{traffic_route_create_schema, traffic_route_update_schema};

use crate::error::{Error, Result};
use crate::networks::merge;

const CACHE_ROUTES: &str = "traffic_routes";

/// Fill in the fields the controller expects on a new route.
pub fn apply_route_defaults(route: &mut Map<String, Value>) {
    let defaults = [
        ("enabled", json!(true)),
        ("kill_switch_enabled", json!(false)),
        ("next_hop", json!("")),
        ("domains", json!([])),
        ("ip_addresses", json!([])),
        ("ip_ranges", json!([])),
        ("regions", json!([])),
    ];
    for (key, value) in defaults {
        route.entry(key).or_insert(value);
    }
}

/// Manages traffic routes.
#[derive(Clone)]
pub struct TrafficRouteManager {
    conn: Arc<Connection>,
}

impl TrafficRouteManager {
    /// Create a manager over a shared connection.
    pub fn new(conn: Arc<Connection>) -> Self {
        Self { conn }
    }

    /// All traffic routes.
    pub async fn list_routes(&self) -> Result<Vec<Value>> {
        Ok(self
            .conn
            .cached_list(CACHE_ROUTES, ApiRequest::get("/trafficroutes").v2())
            .await?)
    }

    /// One route by id.
    pub async fn get_route(&self, route_id: &str) -> Result<Value> {
        self.list_routes()
            .await?
            .into_iter()
            .find(|r| r.get("_id").and_then(Value::as_str) == Some(route_id))
            .ok_or_else(|| Error::not_found("Traffic route", route_id))
    }

    /// Validate a new route and apply defaults without sending it.
    pub fn prepare_route(&self, route: &Value) -> Result<Map<String, Value>> {
        let validator = ResourceValidator::new("Traffic route", &traffic_route_create_schema())?;
        let mut body = validator.validate(route)?;
        apply_route_defaults(&mut body);
        Ok(body)
    }

    /// Create a route. Returns the created object.
    pub async fn create_route(&self, route: &Value) -> Result<Value> {
        let body = self.prepare_route(route)?;
        let response = self
            .conn
            .request(ApiRequest::post("/trafficroutes", Value::Object(body)).v2())
            .await?;
        tracing::info!(
            description = route["description"].as_str().unwrap_or_default(),
            "traffic route created"
        );
        self.conn.invalidate(Some(CACHE_ROUTES));
        if response.get("_id").is_some() {
            return Ok(response);
        }
        Ok(into_list(response).into_iter().next().unwrap_or(Value::Null))
    }

    async fn put_route(&self, route_id: &str, body: Value) -> Result<()> {
        self.conn
            .request(ApiRequest::put(format!("/trafficroutes/{route_id}"), body).v2())
            .await?;
        self.conn.invalidate(Some(CACHE_ROUTES));
        Ok(())
    }

    /// Flip a route's `enabled` flag. Returns the updated route.
    pub async fn toggle_route(&self, route_id: &str) -> Result<Value> {
        let route = self.get_route(route_id).await?;
        let enabled = !route.get("enabled").and_then(Value::as_bool).unwrap_or(false);
        let mut updates = Map::new();
        updates.insert("enabled".into(), Value::Bool(enabled));
        let updated = merge(&route, &updates);
        self.put_route(route_id, updated.clone()).await?;
        tracing::info!(route_id, enabled, "traffic route toggled");
        Ok(updated)
    }

    /// Validate and merge `updates` into a route. Returns the updated route.
    pub async fn update_route(&self, route_id: &str, updates: &Value) -> Result<Value> {
        let validator =
            ResourceValidator::new("Traffic route update", &traffic_route_update_schema())?;
        let fields = validator.validate(updates)?;
        let route = self.get_route(route_id).await?;
        let updated = merge(&route, &fields);
        self.put_route(route_id, updated.clone()).await?;
        tracing::info!(route_id, "traffic route updated");
        Ok(updated)
    }

    /// Delete a route.
    pub async fn delete_route(&self, route_id: &str) -> Result<()> {
        self.conn
            .request(ApiRequest::delete(format!("/trafficroutes/{route_id}")).v2())
            .await?;
        tracing::info!(route_id, "traffic route deleted");
        self.conn.invalidate(Some(CACHE_ROUTES));
        Ok(())
    }
}
