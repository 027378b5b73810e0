//! HTTP transport to a live UniFi Network controller.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, Response, StatusCode};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::api::{ApiRequest, ApiVersion, ControllerApi, HttpMethod};
use crate::config::ControllerConfig;
use crate::error::{Error, Result};

const UNIFI_OS_PREFIX: &str = "/proxy/network";
const CSRF_HEADER: &str = "x-csrf-token";
const UPDATED_CSRF_HEADER: &str = "x-updated-csrf-token";

/// Longest controller error body echoed back in an error message.
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Default)]
struct Session {
    logged_in: bool,
    unifi_os: Option<bool>,
    csrf_token: Option<String>,
}

/// Snapshot of the session used to build one request.
#[derive(Clone, Debug)]
struct SessionInfo {
    unifi_os: bool,
    csrf_token: Option<String>,
}

/// Cookie-authenticated client for one controller site.
///
/// Logs in lazily on the first request, keeps the session cookie in the
/// reqwest cookie store, replays the UniFi OS CSRF token, and re-logs in
/// once when the controller answers 401.
pub struct HttpController {
    config: ControllerConfig,
    http: reqwest::Client,
    probe: reqwest::Client,
    session: Mutex<Session>,
}

impl HttpController {
    /// Build a controller client. No network traffic happens until the
    /// first request.
    pub fn new(config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .timeout(config.timeout())
            .build()?;
        let probe = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(!config.verify_ssl)
            .timeout(config.timeout())
            .build()?;
        let session = Session {
            unifi_os: config.is_unifi_os,
            ..Session::default()
        };
        Ok(Self {
            config,
            http,
            probe,
            session: Mutex::new(session),
        })
    }

    /// Connection settings.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Whether the controller runs UniFi OS, once known.
    pub async fn is_unifi_os(&self) -> Option<bool> {
        self.session.lock().await.unifi_os
    }

    /// Log in now instead of waiting for the first request.
    pub async fn connect(&self) -> Result<()> {
        self.ensure_session().await.map(|_| ())
    }

    /// Forget the current session so the next request logs in again.
    pub async fn reset_session(&self) {
        let mut session = self.session.lock().await;
        session.logged_in = false;
        session.csrf_token = None;
    }

    async fn detect_unifi_os(&self) -> Result<bool> {
        let url = format!("{}/", self.config.base_url());
        let response = self.probe.get(&url).send().await?;
        let unifi_os = response.status() == StatusCode::OK;
        tracing::info!(
            status = response.status().as_u16(),
            unifi_os,
            "detected controller type"
        );
        Ok(unifi_os)
    }

    async fn ensure_session(&self) -> Result<SessionInfo> {
        let mut session = self.session.lock().await;
        let unifi_os = match session.unifi_os {
            Some(known) => known,
            None => {
                let detected = self.detect_unifi_os().await?;
                session.unifi_os = Some(detected);
                detected
            }
        };
        if !session.logged_in {
            session.csrf_token = self.login(unifi_os).await?;
            session.logged_in = true;
        }
        Ok(SessionInfo {
            unifi_os,
            csrf_token: session.csrf_token.clone(),
        })
    }

    async fn login(&self, unifi_os: bool) -> Result<Option<String>> {
        let path = if unifi_os {
            "/api/auth/login"
        } else {
            "/api/login"
        };
        let url = format!("{}{path}", self.config.base_url());
        tracing::debug!(url = %url, username = %self.config.username, "logging in");

        let response = self
            .http
            .post(&url)
            .json(&json!({
                "username": self.config.username,
                "password": self.config.password,
                "remember": true,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "controller rejected login");
            return Err(Error::auth(format!(
                "login returned HTTP {}: {}",
                status.as_u16(),
                truncate(&body)
            )));
        }

        tracing::info!(host = %self.config.host, site = %self.config.site, "logged in to controller");
        Ok(csrf_from_headers(response.headers()))
    }

    fn url_for(&self, request: &ApiRequest, unifi_os: bool) -> String {
        let prefix = if unifi_os { UNIFI_OS_PREFIX } else { "" };
        let site = &self.config.site;
        match request.version {
            ApiVersion::V1 => format!(
                "{}{prefix}/api/s/{site}{}",
                self.config.base_url(),
                request.path
            ),
            ApiVersion::V2 => format!(
                "{}{prefix}/v2/api/site/{site}{}",
                self.config.base_url(),
                request.path
            ),
        }
    }

    async fn send(&self, request: &ApiRequest, session: &SessionInfo) -> Result<Response> {
        let url = self.url_for(request, session.unifi_os);
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        };
        tracing::debug!(method = %request.method, url = %url, "controller request");

        let mut builder = self.http.request(method, &url);
        if let Some(token) = &session.csrf_token {
            builder = builder.header(CSRF_HEADER, token);
        }
        if let Some(data) = &request.data {
            builder = builder.json(data);
        }
        Ok(builder.send().await?)
    }

    async fn handle_response(&self, request: &ApiRequest, response: Response) -> Result<Value> {
        if let Some(token) = response
            .headers()
            .get(UPDATED_CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            self.session.lock().await.csrf_token = Some(token.to_string());
        }

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            tracing::warn!(
                method = %request.method,
                path = %request.path,
                status = status.as_u16(),
                "controller request failed"
            );
            return Err(Error::status(status.as_u16(), error_message(&text, status)));
        }

        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        match request.version {
            ApiVersion::V1 => unwrap_v1(body),
            ApiVersion::V2 => Ok(body),
        }
    }
}

#[async_trait]
impl ControllerApi for HttpController {
    fn site(&self) -> &str {
        &self.config.site
    }

    async fn request(&self, request: ApiRequest) -> Result<Value> {
        let session = self.ensure_session().await?;
        let response = self.send(&request, &session).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return self.handle_response(&request, response).await;
        }

        tracing::info!(path = %request.path, "session expired, logging in again");
        self.reset_session().await;
        let session = self.ensure_session().await?;
        let response = self.send(&request, &session).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::auth("controller rejected the refreshed session"));
        }
        self.handle_response(&request, response).await
    }
}

/// Unwrap a V1 `{meta: {rc, msg}, data}` envelope.
fn unwrap_v1(body: Value) -> Result<Value> {
    let Value::Object(mut map) = body else {
        return Ok(body);
    };
    let Some(meta) = map.get("meta") else {
        return Ok(Value::Object(map));
    };
    if meta.get("rc").and_then(Value::as_str) == Some("error") {
        let msg = meta
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("unknown controller error");
        return Err(Error::api(msg));
    }
    Ok(map.remove("data").unwrap_or(Value::Array(Vec::new())))
}

fn csrf_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CSRF_HEADER)
        .or_else(|| headers.get(UPDATED_CSRF_HEADER))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn error_message(text: &str, status: StatusCode) -> String {
    if let Ok(body) = serde_json::from_str::<Value>(text) {
        let msg = body
            .pointer("/meta/msg")
            .or_else(|| body.get("message"))
            .or_else(|| body.get("error"))
            .and_then(Value::as_str);
        if let Some(msg) = msg {
            return msg.to_string();
        }
    }
    if text.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        truncate(text)
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_ERROR_BODY {
        return text.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
