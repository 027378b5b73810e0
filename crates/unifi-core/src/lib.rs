#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! UniFi MCP Core Library
//!
//! Shared types for every layer of the UniFi MCP server: the error
//! taxonomy, input validators, the permission table, the JSON response
//! envelope, and schema validation for controller payloads.

pub mod error;
pub mod permissions;
pub mod response;
pub mod schema;
pub mod validate;

// Re-exports for convenience
pub use error::{Error, Result};
pub use permissions::{Action, ActionPolicy, CategoryPolicy, Permissions};
pub use response::{CONFIRMATION_REQUIRED, ToolResponse, confirmation_required, create_response};
pub use schema::ResourceValidator;
pub use validate::{PoeMode, mac_eq, normalize_mac, validate_ip_address, validate_mac_address};
