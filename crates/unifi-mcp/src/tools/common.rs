//! Shared plumbing for the tool registries.

use std::future::Future;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, ErrorData, Tool};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use unifi_core::{Action, Permissions, ToolResponse, confirmation_required, validate_mac_address};
use unifi_network::Managers;

use crate::config::ToolSettings;
use crate::error::McpErrorExt;
use crate::registry::ToolResult;

// ---------------------------------------------------------------------------
// Tool definitions
// ---------------------------------------------------------------------------

/// Input schema for the arguments type `T`.
pub(crate) fn schema_of<T: JsonSchema>() -> Arc<Map<String, Value>> {
    let mut schema = match serde_json::to_value(schemars::schema_for!(T)) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    schema.remove("$schema");
    schema.remove("title");
    schema
        .entry("type")
        .or_insert_with(|| Value::String("object".into()));
    Arc::new(schema)
}

/// Tool definition with a schema derived from `T`.
pub(crate) fn make_tool<T: JsonSchema>(name: &'static str, description: &'static str) -> Tool {
    Tool::new(name, description, schema_of::<T>())
}

/// Arguments of tools that take none.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoArgs {}

/// `{"mac": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct MacArgs {
    /// MAC address, any common separator.
    pub mac: String,
}

/// `{"mac": ..., "confirm": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConfirmMacArgs {
    /// MAC address, any common separator.
    pub mac: String,
    /// Must be true to apply. Without it the tool only previews.
    #[serde(default)]
    pub confirm: bool,
}

/// `{"mac": ..., "name": ..., "confirm": ...}`
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenameArgs {
    /// MAC address, any common separator.
    pub mac: String,
    /// New name.
    pub name: String,
    /// Must be true to apply. Without it the tool only previews.
    #[serde(default)]
    pub confirm: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Decode arguments. Absent arguments decode as an empty object.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ErrorData> {
    let args = match args {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(args)
        .map_err(|e| ErrorData::invalid_params(format!("Invalid arguments: {e}"), None))
}

/// Render a response envelope. A `success: false` envelope is flagged as
/// a tool error so clients do not mistake it for data.
pub(crate) fn respond(response: ToolResponse) -> Result<CallToolResult, ErrorData> {
    let failed = !response.is_success();
    let json = serde_json::to_string_pretty(&response).map_err(|e| e.to_mcp_error())?;
    let content = vec![Content::text(json)];
    Ok(if failed {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    })
}

/// Decode arguments, run `handler`, and render its envelope.
pub(crate) fn handle<A, F, Fut>(args: Value, handler: F) -> ToolResult
where
    A: DeserializeOwned + Send + 'static,
    F: FnOnce(A) -> Fut + Send + 'static,
    Fut: Future<Output = ToolResponse> + Send + 'static,
{
    Box::pin(async move {
        let args: A = parse_args(args)?;
        respond(handler(args).await)
    })
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Successful envelope carrying every field of `value`.
///
/// Non-object values land under `data`.
pub(crate) fn ok_fields<T: Serialize>(value: &T) -> ToolResponse {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map
            .into_iter()
            .fold(ToolResponse::ok(), |response, (k, v)| response.with(&k, v)),
        Ok(other) => ToolResponse::ok().with("data", other),
        Err(e) => ToolResponse::failure(e.to_string()),
    }
}

/// Failure envelope for a manager error.
pub(crate) fn failure(err: &unifi_network::Error) -> ToolResponse {
    tracing::error!(error = %err, retryable = err.is_retryable(), "tool failed");
    let response = match err.as_core() {
        Some(core) => ToolResponse::from(core),
        None => ToolResponse::failure(err.to_string()),
    };
    if err.is_retryable() {
        response.with("retryable", true)
    } else {
        response
    }
}

/// `Invalid MAC address format` unless `mac` is a MAC address.
pub(crate) fn check_mac(mac: &str) -> Option<ToolResponse> {
    (!validate_mac_address(mac)).then(|| ToolResponse::failure("Invalid MAC address format"))
}

/// The confirmation envelope unless `confirm` is set.
pub(crate) fn require_confirm(
    confirm: bool,
    warning: impl Into<String>,
    preview: Option<Value>,
) -> Option<ToolResponse> {
    (!confirm).then(|| confirmation_required(warning, preview))
}

/// Field names of an update payload, for responses and warnings.
pub(crate) fn field_names(fields: &Map<String, Value>) -> Vec<String> {
    fields.keys().cloned().collect()
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// What every tool needs: the managers, the permission table, and tool
/// settings.
#[derive(Clone)]
pub struct ToolContext {
    /// Resource managers over one shared connection.
    pub managers: Managers,
    /// Permission table.
    pub permissions: Arc<Permissions>,
    /// Tool settings.
    pub settings: ToolSettings,
}

impl ToolContext {
    /// Bundle the pieces.
    pub fn new(managers: Managers, permissions: Permissions, settings: ToolSettings) -> Self {
        Self {
            managers,
            permissions: Arc::new(permissions),
            settings,
        }
    }

    /// Check permissions, then run `work`. Manager errors become failure
    /// envelopes.
    pub(crate) async fn run<F>(&self, category: &str, action: Action, work: F) -> ToolResponse
    where
        F: Future<Output = unifi_network::Result<ToolResponse>>,
    {
        if let Err(err) = self.permissions.check(category, action) {
            return ToolResponse::from(&err);
        }
        match work.await {
            Ok(response) => response,
            Err(err) => failure(&err),
        }
    }
}

/// The JSON envelope inside a tool result.
#[cfg(test)]
pub(crate) fn result_json(result: &CallToolResult) -> Value {
    result
        .content
        .first()
        .and_then(|c| c.as_text())
        .and_then(|t| serde_json::from_str(&t.text).ok())
        .unwrap_or(Value::Null)
}

/// Context over a mock controller with every action allowed and no PoE
/// cycle delay.
#[cfg(test)]
pub(crate) fn test_context(mock: &Arc<unifi_client::MockController>) -> ToolContext {
    let conn = unifi_client::Connection::new(mock.clone(), std::time::Duration::from_secs(60));
    ToolContext::new(
        Managers::new(Arc::new(conn)),
        Permissions::allow_all(),
        ToolSettings {
            poe_cycle_delay_secs: 0,
        },
    )
}
