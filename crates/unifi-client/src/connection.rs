//! Shared controller handle with a response cache.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::api::{ApiRequest, ControllerApi};
use crate::cache::ResponseCache;
use crate::error::Result;

/// A controller transport plus a TTL cache for list endpoints.
///
/// Managers share one `Connection` through `Arc`. Reads that are safe to
/// serve stale for a few seconds go through [`cached`](Self::cached);
/// writes go through [`request`](Self::request) and then invalidate the
/// affected cache prefix.
pub struct Connection {
    api: Arc<dyn ControllerApi>,
    cache: ResponseCache,
}

impl Connection {
    /// Wrap a transport with a cache of the given TTL.
    pub fn new(api: Arc<dyn ControllerApi>, cache_ttl: Duration) -> Self {
        Self {
            api,
            cache: ResponseCache::new(cache_ttl),
        }
    }

    /// Site every request is scoped to.
    pub fn site(&self) -> &str {
        self.api.site()
    }

    /// Underlying transport.
    pub fn api(&self) -> &Arc<dyn ControllerApi> {
        &self.api
    }

    /// Execute a request without caching.
    pub async fn request(&self, request: ApiRequest) -> Result<Value> {
        self.api.request(request).await
    }

    /// Execute a request and return its payload as a list.
    pub async fn request_list(&self, request: ApiRequest) -> Result<Vec<Value>> {
        self.api.request(request).await.map(into_list)
    }

    /// Serve a cached payload keyed `"{prefix}_{site}"`, fetching on miss.
    pub async fn cached(&self, prefix: &str, request: ApiRequest) -> Result<Value> {
        let key = self.cache_key(prefix);
        if let Some(hit) = self.cache.get(&key) {
            tracing::trace!(key = %key, "cache hit");
            return Ok(hit);
        }
        let value = self.api.request(request).await?;
        self.cache.insert(key, value.clone());
        Ok(value)
    }

    /// Cached list payload.
    pub async fn cached_list(&self, prefix: &str, request: ApiRequest) -> Result<Vec<Value>> {
        self.cached(prefix, request).await.map(into_list)
    }

    /// Drop cached entries starting with `prefix`, or everything when `None`.
    pub fn invalidate(&self, prefix: Option<&str>) {
        match prefix {
            Some(prefix) => self.cache.invalidate_prefix(prefix),
            None => self.cache.clear(),
        }
    }

    fn cache_key(&self, prefix: &str) -> String {
        format!("{prefix}_{}", self.api.site())
    }
}

/// Interpret a controller payload as a list of objects.
///
/// Arrays are returned as-is, `null` is empty, a V2 `{"data": [...]}`
/// wrapper is unwrapped, and any other value becomes a one-element list.
pub fn into_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                map.insert("data".into(), other);
                vec![Value::Object(map)]
            }
            None => vec![Value::Object(map)],
        },
        other => vec![other],
    }
}
