//! Error types for unifi-network

use thiserror::Error;

/// Result type alias for unifi-network operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the resource managers
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from unifi-core (validation, not found, upstream defect, ...)
    #[error(transparent)]
    Core(#[from] unifi_core::Error),

    /// Error talking to the controller
    #[error(transparent)]
    Client(#[from] unifi_client::Error),

    /// A switch-port operation targeted a device that is not a switch.
    #[error("Device {mac} is not a switch")]
    NotASwitch {
        /// MAC address of the device.
        mac: String,
    },

    /// No gateway device and no WAN health data were found.
    #[error("No gateway device found")]
    NoGateway,

    /// The controller returned no `connectivity` setting.
    #[error("No connectivity settings found")]
    NoConnectivitySettings,

    /// No configured network contains the requested IP.
    #[error("Could not determine network for IP {ip}")]
    NetworkNotDetected {
        /// The IP address that matched no subnet.
        ip: String,
    },
}

impl Error {
    /// Creates a not-found error.
    pub fn not_found<S: Into<String>>(kind: &'static str, id: S) -> Self {
        Error::Core(unifi_core::Error::not_found(kind, id))
    }

    /// Creates a validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Core(unifi_core::Error::validation(message))
    }

    /// The underlying core error, if this wraps one.
    pub fn as_core(&self) -> Option<&unifi_core::Error> {
        match self {
            Error::Core(e) => Some(e),
            Error::Client(unifi_client::Error::Core(e)) => Some(e),
            _ => None,
        }
    }

    /// Returns whether a retry might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Core(e) => e.is_retryable(),
            Error::Client(e) => e.is_retryable(),
            _ => false,
        }
    }
}
