//! Error types for unifi-mcp

use rmcp::model::ErrorData;
use thiserror::Error;

/// Result type alias for unifi-mcp operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in unifi-mcp
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from unifi-core
    #[error("Core error: {0}")]
    Core(#[from] unifi_core::Error),

    /// Error from unifi-client
    #[error("Client error: {0}")]
    Client(#[from] unifi_client::Error),

    /// Error from unifi-network
    #[error("Network error: {0}")]
    Network(#[from] unifi_network::Error),

    /// Configuration file problem.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization failure
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Creates a configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config(message.into())
    }
}

/// Conversion of crate errors into MCP protocol errors.
///
/// Only failures that prevent a tool from producing a result at all become
/// protocol errors. Domain failures are reported inside the tool result.
pub trait McpErrorExt {
    /// Convert into an `rmcp` error.
    fn to_mcp_error(&self) -> ErrorData;
}

impl McpErrorExt for unifi_core::Error {
    fn to_mcp_error(&self) -> ErrorData {
        match self {
            unifi_core::Error::Validation { .. } => {
                ErrorData::invalid_params(self.to_string(), None)
            }
            _ => ErrorData::internal_error(self.to_string(), None),
        }
    }
}

impl McpErrorExt for serde_json::Error {
    fn to_mcp_error(&self) -> ErrorData {
        ErrorData::internal_error(self.to_string(), None)
    }
}

impl McpErrorExt for Error {
    fn to_mcp_error(&self) -> ErrorData {
        match self {
            Error::Core(e) => e.to_mcp_error(),
            _ => ErrorData::internal_error(self.to_string(), None),
        }
    }
}
