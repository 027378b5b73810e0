//! Error types for unifi-client

use thiserror::Error;

/// Result type alias for unifi-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to a UniFi controller
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from unifi-core
    #[error("Core error: {0}")]
    Core(#[from] unifi_core::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Login was rejected or the session could not be re-established.
    #[error("Authentication failed: {message}")]
    Auth {
        /// Reason reported by the controller.
        message: String,
    },

    /// The controller answered with an error envelope or a non-success status.
    #[error("Controller API error{}: {message}", fmt_status(.status))]
    Api {
        /// HTTP status, when the error came from a status code.
        status: Option<u16>,
        /// Message from the controller.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// JSON error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl Error {
    /// Creates an API error from a controller message.
    pub fn api<S: Into<String>>(message: S) -> Self {
        Error::Api {
            status: None,
            message: message.into(),
        }
    }

    /// Creates an API error from an HTTP status.
    pub fn status<S: Into<String>>(status: u16, message: S) -> Self {
        Error::Api {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Error::Auth {
            message: message.into(),
        }
    }

    /// Returns whether a retry might succeed.
    ///
    /// Transport failures and 5xx responses are transient. Everything else
    /// (validation, not found, rejected login, upstream defects) is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::Api {
                status: Some(status),
                ..
            } => *status >= 500,
            Error::Core(e) => e.is_retryable(),
            _ => false,
        }
    }
}
