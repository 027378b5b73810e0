//! Connected and known clients.

use std::sync::Arc;

use serde_json::{Value, json};
use unifi_client::{ApiRequest, Connection};
use unifi_core::validate::mac_eq;

use crate::error::{Error, Result};
use crate::models::{Client, from_value};

pub(crate) const CACHE_CLIENTS: &str = "clients";
pub(crate) const CACHE_USERS: &str = "users";

/// A `/cmd/stamgr` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientCommand {
    /// Deny the client network access.
    Block,
    /// Lift a block.
    Unblock,
    /// Disconnect the client so it reconnects.
    Reconnect,
}

impl ClientCommand {
    /// Controller command name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientCommand::Block => "block-sta",
            ClientCommand::Unblock => "unblock-sta",
            ClientCommand::Reconnect => "kick-sta",
        }
    }
}

/// Manages clients.
#[derive(Clone)]
pub struct ClientManager {
    conn: Arc<Connection>,
}

impl ClientManager {
    /// Create a manager over a shared connection.
    pub fn new(conn: Arc<Connection>) -> Self {
        Self { conn }
    }

    /// Currently connected clients (`/stat/sta`).
    pub async fn list_active_raw(&self) -> Result<Vec<Value>> {
        Ok(self
            .conn
            .cached_list(CACHE_CLIENTS, ApiRequest::get("/stat/sta"))
            .await?)
    }

    /// Currently connected clients, typed.
    pub async fn list_active(&self) -> Result<Vec<Client>> {
        self.list_active_raw().await?.into_iter().map(from_value).collect()
    }

    /// Every client the controller has seen (`/rest/user`), including offline ones.
    pub async fn list_known_raw(&self) -> Result<Vec<Value>> {
        Ok(self
            .conn
            .cached_list(CACHE_USERS, ApiRequest::get("/rest/user"))
            .await?)
    }

    /// Known clients, typed.
    pub async fn list_known(&self) -> Result<Vec<Client>> {
        self.list_known_raw().await?.into_iter().map(from_value).collect()
    }

    /// Client by MAC. Active clients are preferred over known records
    /// because they carry live fields such as `ip` and signal.
    pub async fn get_client_raw(&self, mac: &str) -> Result<Value> {
        if let Some(active) = find_by_mac(self.list_active_raw().await?, mac) {
            return Ok(active);
        }
        find_by_mac(self.list_known_raw().await?, mac)
            .ok_or_else(|| Error::not_found("Client", mac))
    }

    /// Known client record by MAC; this is the record writes target.
    pub async fn get_known_client(&self, mac: &str) -> Result<Client> {
        let raw = find_by_mac(self.list_known_raw().await?, mac)
            .ok_or_else(|| Error::not_found("Client", mac))?;
        from_value(raw)
    }

    /// Send a `/cmd/stamgr` command.
    pub async fn command(&self, mac: &str, command: ClientCommand) -> Result<()> {
        self.conn
            .request(ApiRequest::post(
                "/cmd/stamgr",
                json!({ "cmd": command.as_str(), "mac": mac.to_lowercase() }),
            ))
            .await?;
        tracing::info!(mac, cmd = command.as_str(), "client command sent");
        self.invalidate();
        Ok(())
    }

    /// Block a client.
    pub async fn block(&self, mac: &str) -> Result<()> {
        self.command(mac, ClientCommand::Block).await
    }

    /// Unblock a client.
    pub async fn unblock(&self, mac: &str) -> Result<()> {
        self.command(mac, ClientCommand::Unblock).await
    }

    /// Force a client to reconnect.
    pub async fn reconnect(&self, mac: &str) -> Result<()> {
        self.command(mac, ClientCommand::Reconnect).await
    }

    /// Set a client's alias.
    pub async fn rename(&self, mac: &str, name: &str) -> Result<()> {
        let client = self.get_known_client(mac).await?;
        self.conn
            .request(ApiRequest::put(
                format!("/rest/user/{}", client.id),
                json!({ "name": name }),
            ))
            .await?;
        tracing::info!(mac, name, "client renamed");
        self.invalidate();
        Ok(())
    }

    fn invalidate(&self) {
        self.conn.invalidate(Some(CACHE_CLIENTS));
        self.conn.invalidate(Some(CACHE_USERS));
    }
}

pub(crate) fn find_by_mac(items: Vec<Value>, mac: &str) -> Option<Value> {
    items
        .into_iter()
        .find(|c| c.get("mac").and_then(Value::as_str).is_some_and(|m| mac_eq(m, mac)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;
    use unifi_client::MockController;

    fn manager(mock: &Arc<MockController>) -> ClientManager {
        ClientManager::new(Arc::new(Connection::new(mock.clone(), Duration::from_secs(60))))
    }

    #[test]
    fn test_command_names() {
        assert_eq!(ClientCommand::Block.as_str(), "block-sta");
        assert_eq!(ClientCommand::Unblock.as_str(), "unblock-sta");
        assert_eq!(ClientCommand::Reconnect.as_str(), "kick-sta");
    }

    #[tokio::test]
    async fn test_get_client_prefers_active() {
        let mock = Arc::new(MockController::new());
        mock.respond_get("/stat/sta", json!([{"mac": "aa:bb:cc:dd:ee:01", "ip": "192.168.1.20"}]));
        mock.respond_get(
            "/rest/user",
            json!([
                {"_id": "u1", "mac": "aa:bb:cc:dd:ee:01"},
                {"_id": "u2", "mac": "aa:bb:cc:dd:ee:02", "name": "NAS"}
            ]),
        );
        let clients = manager(&mock);

        let active = clients.get_client_raw("AA:BB:CC:DD:EE:01").await.unwrap();
        assert_eq!(active["ip"], "192.168.1.20");
        let offline = clients.get_client_raw("aa:bb:cc:dd:ee:02").await.unwrap();
        assert_eq!(offline["name"], "NAS");
        let err = clients.get_client_raw("aa:bb:cc:dd:ee:03").await.unwrap_err();
        assert_eq!(err.to_string(), "Client not found: aa:bb:cc:dd:ee:03");
    }

    #[tokio::test]
    async fn test_block_sends_stamgr() {
        let mock = Arc::new(MockController::new().accept_writes());
        manager(&mock).block("AA:BB:CC:DD:EE:01").await.unwrap();
        let req = mock.last_request().unwrap();
        assert_eq!(req.path, "/cmd/stamgr");
        assert_eq!(req.data.unwrap(), json!({"cmd": "block-sta", "mac": "aa:bb:cc:dd:ee:01"}));
    }

    #[tokio::test]
    async fn test_rename_targets_known_record() {
        let mock = Arc::new(MockController::new().accept_writes());
        mock.respond_get("/rest/user", json!([{"_id": "u7", "mac": "aa:bb:cc:dd:ee:07"}]));
        manager(&mock).rename("aa:bb:cc:dd:ee:07", "Printer").await.unwrap();
        let req = mock.last_request().unwrap();
        assert_eq!(req.path, "/rest/user/u7");
        assert_eq!(req.data.unwrap(), json!({"name": "Printer"}));
    }

    #[tokio::test]
    async fn test_write_invalidates_client_caches() {
        let mock = Arc::new(MockController::new().accept_writes());
        mock.respond_get("/stat/sta", json!([]));
        let clients = manager(&mock);
        clients.list_active_raw().await.unwrap();
        clients.list_active_raw().await.unwrap();
        assert_eq!(mock.request_count(), 1);
        clients.reconnect("aa:bb:cc:dd:ee:01").await.unwrap();
        clients.list_active_raw().await.unwrap();
        assert_eq!(mock.request_count(), 3);
    }
}
