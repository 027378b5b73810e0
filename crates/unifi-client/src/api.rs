//! Request descriptions and the controller transport trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// HTTP method of a controller request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which controller API family a path belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// `/api/s/{site}` endpoints wrapped in a `{meta, data}` envelope.
    #[default]
    V1,
    /// `/v2/api/site/{site}` endpoints returning bare JSON.
    V2,
}

/// A site-relative controller request.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path below the site prefix, starting with `/`.
    pub path: String,
    /// Optional JSON body.
    pub data: Option<Value>,
    /// API family.
    pub version: ApiVersion,
}

impl ApiRequest {
    /// Build a request.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        Self {
            method,
            path,
            data: None,
            version: ApiVersion::V1,
        }
    }

    /// GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// POST request with a body.
    pub fn post(path: impl Into<String>, data: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_data(data)
    }

    /// PUT request with a body.
    pub fn put(path: impl Into<String>, data: Value) -> Self {
        Self::new(HttpMethod::Put, path).with_data(data)
    }

    /// DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Attach a body.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Mark the request as a V2 API call.
    pub fn v2(mut self) -> Self {
        self.version = ApiVersion::V2;
        self
    }

    /// Whether the request changes controller state.
    pub fn is_mutating(&self) -> bool {
        self.method != HttpMethod::Get
    }
}

/// Transport to a UniFi controller.
///
/// Implementations resolve site-relative requests, handle authentication,
/// and unwrap response envelopes. [`crate::HttpController`] talks to a real
/// controller; [`crate::MockController`] serves canned responses in tests.
#[async_trait]
pub trait ControllerApi: Send + Sync {
    /// Site the requests are scoped to.
    fn site(&self) -> &str;

    /// Execute a request, returning the unwrapped payload.
    async fn request(&self, request: ApiRequest) -> Result<Value>;

    /// Probe the controller with a cheap read.
    async fn ping(&self) -> Result<()> {
        self.request(ApiRequest::get("/stat/sysinfo")).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builders() {
        let req = ApiRequest::put("rest/device/abc", json!({"name": "Core"}));
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "/rest/device/abc");
        assert_eq!(req.version, ApiVersion::V1);
        assert!(req.is_mutating());

        let req = ApiRequest::get("/firewall-policies").v2();
        assert_eq!(req.version, ApiVersion::V2);
        assert!(req.data.is_none());
        assert!(!req.is_mutating());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}
