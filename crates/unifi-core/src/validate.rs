//! Input validators for addresses and switch-port settings.
//!
//! Tools validate user-supplied identifiers here before a request reaches
//! the controller.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MAC_SEPARATORS: [char; 3] = [':', '-', '.'];

fn mac_digits(mac: &str) -> String {
    mac.chars()
        .filter(|c| !MAC_SEPARATORS.contains(c))
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Validate a MAC address.
///
/// Accepts colon, dash, or dot separators (or none), in any case. After
/// removing separators exactly 12 hexadecimal digits must remain.
///
/// # Examples
///
/// ```
/// use unifi_core::validate::validate_mac_address;
///
/// assert!(validate_mac_address("aa:bb:cc:dd:ee:ff"));
/// assert!(validate_mac_address("AABB.CCDD.EEFF"));
/// assert!(!validate_mac_address("aa:bb:cc:dd:ee"));
/// ```
pub fn validate_mac_address(mac: &str) -> bool {
    let digits = mac_digits(mac);
    digits.len() == 12 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Normalize a MAC address to lower-case, colon-separated form.
///
/// Returns a validation error if the input is not a MAC address.
///
/// ```
/// use unifi_core::validate::normalize_mac;
///
/// assert_eq!(normalize_mac("AA-BB-CC-DD-EE-FF").unwrap(), "aa:bb:cc:dd:ee:ff");
/// ```
pub fn normalize_mac(mac: &str) -> Result<String> {
    if !validate_mac_address(mac) {
        return Err(Error::validation_field("mac", "Invalid MAC address format"));
    }
    let digits = mac_digits(mac);
    let pairs: Vec<&str> = (0..6).map(|i| &digits[i * 2..i * 2 + 2]).collect();
    Ok(pairs.join(":"))
}

/// Compare two MAC addresses ignoring case and separators.
pub fn mac_eq(a: &str, b: &str) -> bool {
    mac_digits(a) == mac_digits(b)
}

/// Validate an IPv4 or IPv6 address literal.
pub fn validate_ip_address(ip: &str) -> bool {
    !ip.is_empty() && IpAddr::from_str(ip).is_ok()
}

/// Power-over-Ethernet mode for a switch port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoeMode {
    /// 802.3af/at negotiated power.
    Auto,
    /// Passive 24V power.
    Passive,
    /// Pass power through from the uplink.
    Passthrough,
    /// No power.
    Off,
}

impl PoeMode {
    /// All accepted modes, in display order.
    pub const ALL: [PoeMode; 4] = [
        PoeMode::Auto,
        PoeMode::Passive,
        PoeMode::Passthrough,
        PoeMode::Off,
    ];

    /// Controller wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            PoeMode::Auto => "auto",
            PoeMode::Passive => "passive",
            PoeMode::Passthrough => "passthrough",
            PoeMode::Off => "off",
        }
    }
}

impl fmt::Display for PoeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PoeMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = PoeMode::ALL.iter().map(PoeMode::as_str).collect();
                Error::validation_field(
                    "poe_mode",
                    format!("Invalid PoE mode. Must be one of: {}", valid.join(", ")),
                )
            })
    }
}
