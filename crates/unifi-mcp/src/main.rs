//! unifi-mcp entry point.

use clap::Parser;
use unifi_mcp::cli::{self, Cli};
use unifi_mcp::config::{Config, ServerSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the MCP stream, so logs go to stderr.
    let directive = Config::load(cli.config.as_deref())
        .map(|c| c.server.log_level)
        .unwrap_or_else(|_| ServerSettings::default().log_level);
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| directive.into()),
        )
        .init();

    cli::run(cli).await
}
