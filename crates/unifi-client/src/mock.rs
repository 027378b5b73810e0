//! In-memory controller for tests and offline tool listing.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::{ApiRequest, ControllerApi, HttpMethod};
use crate::error::{Error, Result};

#[derive(Clone)]
enum Reply {
    Ok(Value),
    Fail(String),
}

/// A [`ControllerApi`] that serves canned payloads and records requests.
///
/// Responses are keyed by method and site-relative path. Unmatched
/// requests fail with HTTP 404 unless [`accept_writes`](Self::accept_writes)
/// is set, in which case unmatched writes succeed with an empty list.
pub struct MockController {
    site: String,
    replies: Mutex<HashMap<(HttpMethod, String), Reply>>,
    log: Mutex<Vec<ApiRequest>>,
    accept_writes: bool,
}

impl Default for MockController {
    fn default() -> Self {
        Self::new()
    }
}

impl MockController {
    /// Mock for site `default`.
    pub fn new() -> Self {
        Self {
            site: "default".to_string(),
            replies: Mutex::new(HashMap::new()),
            log: Mutex::new(Vec::new()),
            accept_writes: false,
        }
    }

    /// Use a different site name.
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    /// Let unmatched POST/PUT/DELETE requests succeed.
    pub fn accept_writes(mut self) -> Self {
        self.accept_writes = true;
        self
    }

    /// Register a payload for `method path`.
    pub fn respond(&self, method: HttpMethod, path: &str, payload: Value) {
        self.insert(method, path, Reply::Ok(payload));
    }

    /// Register a payload for `GET path`.
    pub fn respond_get(&self, path: &str, payload: Value) {
        self.respond(HttpMethod::Get, path, payload);
    }

    /// Make `method path` fail with a controller error.
    pub fn fail(&self, method: HttpMethod, path: &str, message: &str) {
        self.insert(method, path, Reply::Fail(message.to_string()));
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        self.log.lock().map(|log| log.len()).unwrap_or(0)
    }

    /// Requests that would change controller state.
    pub fn mutating_requests(&self) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(ApiRequest::is_mutating)
            .collect()
    }

    /// Most recent request.
    pub fn last_request(&self) -> Option<ApiRequest> {
        self.log.lock().ok().and_then(|log| log.last().cloned())
    }

    fn insert(&self, method: HttpMethod, path: &str, reply: Reply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.insert((method, path.to_string()), reply);
        }
    }
}

#[async_trait]
impl ControllerApi for MockController {
    fn site(&self) -> &str {
        &self.site
    }

    async fn request(&self, request: ApiRequest) -> Result<Value> {
        if let Ok(mut log) = self.log.lock() {
            log.push(request.clone());
        }
        let reply = self
            .replies
            .lock()
            .ok()
            .and_then(|replies| replies.get(&(request.method, request.path.clone())).cloned());
        match reply {
            Some(Reply::Ok(value)) => Ok(value),
            Some(Reply::Fail(message)) => Err(Error::api(message)),
            None if self.accept_writes && request.is_mutating() => Ok(Value::Array(Vec::new())),
            None => Err(Error::status(
                404,
                format!("no mock response for {} {}", request.method, request.path),
            )),
        }
    }
}
