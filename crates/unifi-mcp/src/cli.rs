//! Command-line interface.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use unifi_client::{Connection, HttpController, MockController};
use unifi_network::Managers;

use crate::config::{
    Config, cmd_config_get, cmd_config_init, cmd_config_path, cmd_config_set, resolve_config_path,
};
use crate::error::Error;
use crate::registry::{CompositeRegistry, ToolRegistry};
use crate::server::UnifiMcpServer;
use crate::tools::{ToolContext, build_registry};

/// Server version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP server for UniFi Network controllers
#[derive(Parser, Debug)]
#[command(name = "unifi-mcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Command to run. Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve MCP over stdio
    Serve,
    /// Inspect or edit the config file
    Config {
        /// Config operation
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List the tools the server exposes
    Tools,
}

/// `config` subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the config file path
    Path,
    /// Print a value by dotted key, e.g. `controller.host`
    Get {
        /// Dotted key
        key: String,
    },
    /// Set a value by dotted key in the config file
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },
    /// Write a default config file
    Init {
        /// Where to write it. Defaults to the resolved config path.
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// The command to run.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    fn config_file(&self) -> crate::error::Result<PathBuf> {
        resolve_config_path(self.config.as_deref(), |key| std::env::var(key).ok())
            .ok_or_else(|| Error::config("Could not determine config directory for this platform"))
    }
}

/// Run the parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command() {
        Command::Serve => serve(Config::load(cli.config.as_deref())?).await,
        Command::Tools => {
            print_tools(&offline_registry(&Config::load(cli.config.as_deref())?));
            Ok(())
        }
        Command::Config { action } => match action {
            ConfigAction::Path => Ok(cmd_config_path(cli.config.as_deref())?),
            ConfigAction::Get { key } => Ok(cmd_config_get(cli.config.as_deref(), &key)?),
            ConfigAction::Set { key, value } => {
                Ok(cmd_config_set(&cli.config_file()?, &key, &value)?)
            }
            ConfigAction::Init { file, force } => {
                let path = match file {
                    Some(path) => path,
                    None => cli.config_file()?,
                };
                Ok(cmd_config_init(&path, force)?)
            }
        },
    }
}

/// Wire the controller client, managers, and tools, then serve over stdio.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let controller = HttpController::new(config.controller.clone())?;
    tracing::info!(
        url = %config.controller.base_url(),
        site = %config.controller.site,
        "connecting to controller"
    );
    if let Err(err) = controller.connect().await {
        tracing::warn!(error = %err, "initial login failed, retrying on the first tool call");
    }
    let conn = Connection::new(Arc::new(controller), config.controller.cache_ttl());
    let ctx = ToolContext::new(
        Managers::new(Arc::new(conn)),
        config.permissions.clone(),
        config.tools.clone(),
    );
    let registry = build_registry(ctx, &config.server.name, VERSION);
    UnifiMcpServer::new(registry)
        .with_name(&config.server.name)
        .with_version(VERSION)
        .serve_stdio()
        .await
}

/// The registry over a controller stand-in that is never contacted.
fn offline_registry(config: &Config) -> CompositeRegistry {
    let controller = MockController::new().with_site(&config.controller.site);
    let conn = Connection::new(Arc::new(controller), Duration::ZERO);
    let ctx = ToolContext::new(
        Managers::new(Arc::new(conn)),
        config.permissions.clone(),
        config.tools.clone(),
    );
    build_registry(ctx, &config.server.name, VERSION)
}

fn print_tools(registry: &CompositeRegistry) {
    for tool in registry.tools() {
        let description = tool.description.as_deref().unwrap_or_default();
        println!("{:<40} {description}", tool.name);
    }
    println!("\n{} tools", registry.tool_count());
}
