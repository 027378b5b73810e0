//! The JSON envelope every tool returns.
//!
//! Tool results are JSON objects with a `success` flag. Failures carry an
//! `error` string; confirmation-gated tools add a `warning` and, when
//! available, a `preview` of what would be sent to the controller.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Error;

/// Message returned when a mutating tool is called without `confirm: true`.
pub const CONFIRMATION_REQUIRED: &str = "Confirmation required. Set 'confirm' to true.";

/// Message returned when permissions forbid an operation.
pub const PERMISSION_DENIED: &str = "Permission denied";

/// A tool result under construction.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToolResponse(Map<String, Value>);

impl ToolResponse {
    /// A successful response with no payload yet.
    pub fn ok() -> Self {
        let mut map = Map::new();
        map.insert("success".into(), Value::Bool(true));
        Self(map)
    }

    /// A failed response carrying `error`.
    pub fn failure(error: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("success".into(), Value::Bool(false));
        map.insert("error".into(), Value::String(error.into()));
        Self(map)
    }

    /// Add a field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Add a serializable field. Serialization failures store `null`.
    pub fn with_serialized<T: Serialize>(self, key: &str, value: &T) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.with(key, value)
    }

    /// Whether the `success` flag is set.
    pub fn is_success(&self) -> bool {
        self.0.get("success").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Convert into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<ToolResponse> for Value {
    fn from(response: ToolResponse) -> Self {
        response.into_value()
    }
}

impl From<&Error> for ToolResponse {
    fn from(err: &Error) -> Self {
        match err {
            Error::PermissionDenied { .. } => ToolResponse::failure(PERMISSION_DENIED),
            Error::ConfirmationRequired { warning } => {
                ToolResponse::failure(CONFIRMATION_REQUIRED).with("warning", warning.as_str())
            }
            Error::UpstreamDefect {
                reason,
                workarounds,
                ..
            } => ToolResponse::failure(err.to_string())
                .with("reason", reason.as_str())
                .with("retryable", false)
                .with("workarounds", workarounds.clone()),
            _ => ToolResponse::failure(err.to_string()),
        }
    }
}

/// Standard envelope for creation operations.
///
/// A string payload on success becomes `id`; any other payload becomes
/// `data`. On failure only `error` is added.
///
/// ```
/// use serde_json::json;
/// use unifi_core::response::create_response;
///
/// assert_eq!(
///     create_response(true, Some(json!("abc123")), None),
///     json!({"success": true, "id": "abc123"})
/// );
/// ```
pub fn create_response(success: bool, data: Option<Value>, error: Option<&str>) -> Value {
    let mut response = Map::new();
    response.insert("success".into(), Value::Bool(success));
    if success {
        match data {
            Some(Value::String(id)) => {
                response.insert("id".into(), Value::String(id));
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                response.insert("data".into(), other);
            }
        }
    } else if let Some(error) = error {
        response.insert("error".into(), Value::String(error.to_string()));
    }
    Value::Object(response)
}

/// Envelope returned by a mutating tool that was not confirmed.
pub fn confirmation_required(warning: impl Into<String>, preview: Option<Value>) -> ToolResponse {
    let response =
        ToolResponse::failure(CONFIRMATION_REQUIRED).with("warning", Value::String(warning.into()));
    match preview {
        Some(preview) => response.with("preview", preview),
        None => response,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_response_string_becomes_id() {
        let v = create_response(true, Some(json!("64f0")), None);
        assert_eq!(v, json!({"success": true, "id": "64f0"}));
    }

    #[test]
    fn test_create_response_object_becomes_data() {
        let v = create_response(true, Some(json!({"name": "IoT"})), Some("ignored"));
        assert_eq!(v, json!({"success": true, "data": {"name": "IoT"}}));
    }

    #[test]
    fn test_create_response_failure() {
        let v = create_response(false, Some(json!("ignored")), Some("boom"));
        assert_eq!(v, json!({"success": false, "error": "boom"}));
        assert_eq!(create_response(false, None, None), json!({"success": false}));
    }

    #[test]
    fn test_confirmation_required_envelope() {
        let r = confirmation_required("This will disable port 3", Some(json!({"port_idx": 2})));
        assert!(!r.is_success());
        let v = r.into_value();
        assert_eq!(v["error"], CONFIRMATION_REQUIRED);
        assert_eq!(v["warning"], "This will disable port 3");
        assert_eq!(v["preview"]["port_idx"], 2);
    }

    #[test]
    fn test_from_upstream_defect() {
        let err = Error::UpstreamDefect {
            operation: "Firewall policy creation".into(),
            reason: "broken".into(),
            workarounds: vec!["a".into(), "b".into()],
        };
        let v = ToolResponse::from(&err).into_value();
        assert_eq!(v["success"], false);
        assert_eq!(v["retryable"], false);
        assert_eq!(v["workarounds"], json!(["a", "b"]));
    }

    #[test]
    fn test_from_permission_denied() {
        let err = Error::permission_denied("devices", "update");
        let v = ToolResponse::from(&err).into_value();
        assert_eq!(v, json!({"success": false, "error": "Permission denied"}));
    }

    #[test]
    fn test_builder() {
        let r = ToolResponse::ok().with("count", 2).with("site", "default");
        assert!(r.is_success());
        assert_eq!(r.get("count"), Some(&json!(2)));
    }
}
