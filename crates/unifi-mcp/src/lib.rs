#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! MCP server for UniFi Network controllers.
//!
//! Exposes devices, switch ports, clients, DHCP reservations, networks,
//! WLANs, WAN status, firewall policies, and traffic routes as MCP tools.
//! Every change is previewed first and applied only when the caller
//! repeats the call with `confirm: true`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        unifi-mcp                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  UnifiMcpServer: ServerHandler over a CompositeRegistry     │
//! │  ToolRegistry trait: tool registration and dispatch         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  tools: one registry per resource family                    │
//! │  ├── health, unifi_tool_guide                               │
//! │  ├── devices, switch ports, clients, DHCP                   │
//! │  ├── networks and WLANs, WAN (read-only)                    │
//! │  └── firewall, traffic routes, system                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  guide: intent table and the tools that always fail         │
//! │  config: TOML file, UNIFI_* overrides, config commands      │
//! └─────────────────────────────────────────────────────────────┘
//!            │
//!            ▼
//!   unifi-network managers → unifi-client → controller
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use unifi_client::{Connection, HttpController};
//! use unifi_mcp::{Config, ToolContext, UnifiMcpServer, build_registry};
//! use unifi_network::Managers;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load(None)?;
//! let controller = HttpController::new(config.controller.clone())?;
//! let conn = Connection::new(Arc::new(controller), Duration::from_secs(30));
//! let ctx = ToolContext::new(
//!     Managers::new(Arc::new(conn)),
//!     config.permissions.clone(),
//!     config.tools.clone(),
//! );
//! UnifiMcpServer::new(build_registry(ctx, "unifi-mcp", "0.3.0"))
//!     .serve_stdio()
//!     .await
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod guide;
pub mod registry;
pub mod server;
pub mod tools;

// Re-exports: registry
pub use registry::{CompositeRegistry, ToolRegistry, ToolResult};

// Re-exports: server
pub use server::{ServerConfig, UnifiMcpServer};

// Re-exports: config and errors
pub use config::{Config, ServerSettings, ToolSettings};
pub use error::{Error, McpErrorExt, Result};

// Re-exports: tools
pub use tools::{HealthResponse, HealthTools, ToolContext, build_registry, handle_health};
