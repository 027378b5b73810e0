//! Server configuration.
//!
//! Settings come from a TOML file and are then overridden by `UNIFI_*`
//! environment variables. The file is located by, in order:
//! the `--config` flag, `UNIFI_MCP_CONFIG`, and
//! `<config dir>/unifi-mcp/config.toml`. A missing default file is not an
//! error; an explicitly named one is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use unifi_client::ControllerConfig;
use unifi_core::Permissions;

use crate::error::{Error, Result};

/// Name used for the config directory and the MCP server identity.
pub const PROJECT_NAME: &str = "unifi-mcp";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "UNIFI_MCP_CONFIG";

/// Top-level configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// MCP server settings.
    pub server: ServerSettings,
    /// How to reach the controller.
    pub controller: ControllerConfig,
    /// Which tool categories may read, create, update, or delete.
    pub permissions: Permissions,
    /// Tool behaviour.
    pub tools: ToolSettings,
}

/// MCP server identity and logging.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Name reported to MCP clients.
    pub name: String,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            name: PROJECT_NAME.to_string(),
            log_level: "info,unifi=debug".to_string(),
        }
    }
}

/// Tool behaviour knobs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Seconds PoE stays off during `unifi_restart_poe_port`.
    pub poe_cycle_delay_secs: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            poe_cycle_delay_secs: 5,
        }
    }
}

impl ToolSettings {
    /// PoE cycle delay as a `Duration`.
    pub fn poe_cycle_delay(&self) -> Duration {
        Duration::from_secs(self.poe_cycle_delay_secs)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Path of the config file when nothing names one explicitly.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(PROJECT_NAME).join("config.toml"))
}

/// Resolve the config file path. The flag wins over the environment, which
/// wins over the platform default.
pub fn resolve_config_path<F>(explicit: Option<&str>, env: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .map(PathBuf::from)
        .or_else(|| env(CONFIG_ENV).map(PathBuf::from))
        .or_else(default_config_path)
}

fn parse_bool(var: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!("{var} must be a boolean, got '{raw}'"))),
    }
}

impl Config {
    /// Load from the resolved path and the process environment.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    /// Load using `env` in place of the process environment.
    pub fn load_with<F>(explicit: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let named = explicit.is_some() || env(CONFIG_ENV).is_some();
        let mut config = match resolve_config_path(explicit, &env) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) if named => {
                return Err(Error::config(format!(
                    "Config file not found at {}",
                    path.display()
                )));
            }
            _ => Self::default(),
        };
        config.apply_env(env)?;
        Ok(config)
    }

    /// Parse a config file without applying environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Apply `UNIFI_*` overrides.
    pub fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let controller = &mut self.controller;
        if let Some(host) = env("UNIFI_HOST") {
            controller.host = host;
        }
        if let Some(port) = env("UNIFI_PORT") {
            controller.port = port
                .trim()
                .parse()
                .map_err(|_| Error::config(format!("UNIFI_PORT must be a port number, got '{port}'")))?;
        }
        if let Some(username) = env("UNIFI_USERNAME") {
            controller.username = username;
        }
        if let Some(password) = env("UNIFI_PASSWORD") {
            controller.password = password;
        }
        if let Some(site) = env("UNIFI_SITE") {
            controller.site = site;
        }
        if let Some(raw) = env("UNIFI_VERIFY_SSL") {
            controller.verify_ssl = parse_bool("UNIFI_VERIFY_SSL", &raw)?;
        }
        if let Some(raw) = env("UNIFI_IS_UDM") {
            controller.is_unifi_os = Some(parse_bool("UNIFI_IS_UDM", &raw)?);
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ============================================================================
// Config subcommands
// ============================================================================

/// Print the resolved config file path.
pub fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    let path = resolve_config_path(config_path, |key| std::env::var(key).ok())
        .ok_or_else(|| Error::config("Could not determine config directory for this platform"))?;
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(file does not exist, run `{PROJECT_NAME} config init` to create it)");
    }
    Ok(())
}

/// Look up a dotted key in `config`. Sections print as TOML.
pub fn config_value(config: &Config, key: &str) -> Result<String> {
    let root = toml::Value::try_from(config)?;
    let value = get_nested_value(&root, key)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))?;
    Ok(match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Table(section) => toml::to_string_pretty(section)?.trim_end().to_string(),
        scalar => scalar.to_string(),
    })
}

/// Print a dotted key from the effective configuration.
///
/// Environment overrides are applied, so the value is the one the server
/// would use.
pub fn cmd_config_get(config_path: Option<&str>, key: &str) -> Result<()> {
    let config = Config::load(config_path)?;
    println!("{}", config_value(&config, key)?);
    Ok(())
}

/// Set a dotted key in an existing config file.
pub fn cmd_config_set(config_path: &Path, key: &str, value: &str) -> Result<()> {
    if !config_path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `{PROJECT_NAME} config init` first.",
            config_path.display()
        )));
    }
    let content = std::fs::read_to_string(config_path)?;
    let mut doc: toml::Value = toml::from_str(&content)?;
    set_nested_value(&mut doc, key, typed_value(key, value)?)?;

    // Reject edits the server could not load.
    let rendered = toml::to_string_pretty(&doc)?;
    toml::from_str::<Config>(&rendered)?;

    std::fs::write(config_path, rendered)?;
    println!("Set {key} = {value} in {}", config_path.display());
    Ok(())
}

/// Write a default config file.
pub fn cmd_config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Config::default().to_toml_string()?)?;
    println!("Config file created at {}", path.display());
    Ok(())
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

/// Navigate a dotted key path.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key path, creating intermediate tables.
pub fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let mut parts: Vec<&str> = key.split('.').collect();
    let last = parts
        .pop()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::config("Empty key path"))?;

    let mut current = root;
    for part in parts {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?;
        current = table
            .entry(part.to_string())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?
        .insert(last.to_string(), value);
    Ok(())
}

/// Parse a command-line value as the type `key` has in the default config,
/// so `controller.password 12345` stays a string. Keys the default config
/// leaves unset (permission overrides) take a bool or integer when the text
/// reads as one.
pub fn typed_value(key: &str, raw: &str) -> Result<toml::Value> {
    let defaults = toml::Value::try_from(Config::default())?;
    let mismatch = |kind: &str| Error::config(format!("{key} expects {kind}, got '{raw}'"));
    match get_nested_value(&defaults, key) {
        Some(toml::Value::String(_)) => Ok(toml::Value::String(raw.to_string())),
        Some(toml::Value::Boolean(_)) => raw
            .parse()
            .map(toml::Value::Boolean)
            .map_err(|_| mismatch("true or false")),
        Some(toml::Value::Integer(_)) => raw
            .parse()
            .map(toml::Value::Integer)
            .map_err(|_| mismatch("an integer")),
        Some(toml::Value::Table(_)) => Err(Error::config(format!(
            "{key} is a section; set one of its keys instead"
        ))),
        _ => Ok(raw
            .parse()
            .map(toml::Value::Boolean)
            .or_else(|_| raw.parse().map(toml::Value::Integer))
            .unwrap_or_else(|_| toml::Value::String(raw.to_string()))),
    }
}

// ============================================================================
// Tests
// ============================================================================
