//! Site health and controller system information.

use std::sync::Arc;

use serde_json::Value;
use unifi_client::{ApiRequest, Connection};

use crate::error::{Error, Result};

/// The health entry for one subsystem (`wan`, `lan`, `wlan`, `www`, `vpn`).
pub fn subsystem<'a>(health: &'a [Value], name: &str) -> Option<&'a Value> {
    health
        .iter()
        .find(|s| s.get("subsystem").and_then(Value::as_str) == Some(name))
}

/// Reads site health and controller information.
#[derive(Clone)]
pub struct SystemManager {
    conn: Arc<Connection>,
}

impl SystemManager {
    /// Create a manager over a shared connection.
    pub fn new(conn: Arc<Connection>) -> Self {
        Self { conn }
    }

    /// Per-subsystem health (`/stat/health`).
    pub async fn health(&self) -> Result<Vec<Value>> {
        Ok(self.conn.request_list(ApiRequest::get("/stat/health")).await?)
    }

    /// Controller system information (`/stat/sysinfo`).
    pub async fn sysinfo(&self) -> Result<Value> {
        self.conn
            .request_list(ApiRequest::get("/stat/sysinfo"))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("System info", self.conn.site()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use unifi_client::MockController;

    #[test]
    fn test_subsystem_lookup() {
        let health = vec![
            json!({"subsystem": "lan", "status": "ok"}),
            json!({"subsystem": "wan", "status": "warning"}),
        ];
        assert_eq!(subsystem(&health, "wan").unwrap()["status"], "warning");
        assert!(subsystem(&health, "vpn").is_none());
    }

    #[tokio::test]
    async fn test_sysinfo_takes_first_item() {
        let mock = Arc::new(MockController::new());
        mock.respond_get("/stat/sysinfo", json!([{"version": "8.0.26", "hostname": "udm"}]));
        let system = SystemManager::new(Arc::new(Connection::new(mock, Duration::ZERO)));
        assert_eq!(system.sysinfo().await.unwrap()["version"], "8.0.26");
    }

    #[tokio::test]
    async fn test_empty_sysinfo_is_not_found() {
        let mock = Arc::new(MockController::new());
        mock.respond_get("/stat/sysinfo", json!([]));
        let system = SystemManager::new(Arc::new(Connection::new(mock, Duration::ZERO)));
        assert!(system.sysinfo().await.is_err());
    }
}
