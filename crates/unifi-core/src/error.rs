//! Error types for unifi-core.

/// Errors shared by every layer of the UniFi MCP server.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Input failed validation before anything was sent to the controller.
    #[error("Validation error: {message}")]
    Validation {
        /// Field that failed validation, when known.
        field: Option<String>,
        /// What went wrong.
        message: String,
    },

    /// A controller object could not be found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Object kind ("Device", "Client", "Network", ...).
        kind: &'static str,
        /// Identifier that was looked up (MAC address or `_id`).
        id: String,
    },

    /// The configured permissions forbid this operation.
    #[error("Permission denied: {action} on {category}")]
    PermissionDenied {
        /// Permission category ("firewall", "devices", ...).
        category: String,
        /// Action ("read", "create", "update", "delete").
        action: String,
    },

    /// A mutating operation was requested without confirmation.
    #[error("Confirmation required: {warning}")]
    ConfirmationRequired {
        /// Description of what would happen.
        warning: String,
    },

    /// The controller is known to reject this operation.
    ///
    /// Retrying never helps; the workarounds list what to do instead.
    #[error("{operation} is unavailable: {reason}")]
    UpstreamDefect {
        /// Operation that cannot be performed.
        operation: String,
        /// Description of the upstream defect.
        reason: String,
        /// Alternatives that achieve a similar outcome.
        workarounds: Vec<String>,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for unifi-core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a new validation error with a field name.
    pub fn validation_field<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates a new not-found error.
    pub fn not_found<S: Into<String>>(kind: &'static str, id: S) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a new permission-denied error.
    pub fn permission_denied<C, A>(category: C, action: A) -> Self
    where
        C: Into<String>,
        A: Into<String>,
    {
        Error::PermissionDenied {
            category: category.into(),
            action: action.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}
