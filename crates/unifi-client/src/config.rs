//! Controller connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How to reach and authenticate against a UniFi Network controller.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Hostname, IP, or full URL (`https://10.0.0.1`) of the controller.
    pub host: String,
    /// HTTPS port, ignored when `host` already carries a scheme.
    pub port: u16,
    /// Local admin username.
    pub username: String,
    /// Local admin password.
    pub password: String,
    /// Site name (`default` on single-site installs).
    pub site: String,
    /// Verify the controller's TLS certificate.
    pub verify_ssl: bool,
    /// Whether the controller runs UniFi OS (UDM, UDR, Cloud Key Gen2+).
    /// Detected on first login when unset.
    pub is_unifi_os: Option<bool>,
    /// Seconds a cached list stays fresh.
    pub cache_ttl_secs: u64,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 443,
            username: String::new(),
            password: String::new(),
            site: "default".to_string(),
            verify_ssl: false,
            is_unifi_os: None,
            cache_ttl_secs: 10,
            timeout_secs: 30,
        }
    }
}

impl std::fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("site", &self.site)
            .field("verify_ssl", &self.verify_ssl)
            .field("is_unifi_os", &self.is_unifi_os)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ControllerConfig {
    /// Base URL without a trailing slash.
    ///
    /// ```
    /// use unifi_client::ControllerConfig;
    ///
    /// let mut config = ControllerConfig { host: "10.0.0.1".into(), ..Default::default() };
    /// assert_eq!(config.base_url(), "https://10.0.0.1:443");
    /// config.host = "http://localhost:8080/".into();
    /// assert_eq!(config.base_url(), "http://localhost:8080");
    /// ```
    pub fn base_url(&self) -> String {
        if self.host.contains("://") {
            self.host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}:{}", self.host, self.port)
        }
    }

    /// Cache TTL as a `Duration`.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns an error message for settings that make a connection impossible.
    pub fn validate(&self) -> unifi_core::Result<()> {
        if self.host.trim().is_empty() {
            return Err(unifi_core::Error::config("controller host is not set"));
        }
        if self.username.is_empty() || self.password.is_empty() {
            return Err(unifi_core::Error::config(
                "controller username and password are required",
            ));
        }
        if self.site.is_empty() {
            return Err(unifi_core::Error::config("site must not be empty"));
        }
        Ok(())
    }
}
