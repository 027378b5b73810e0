//! Which tool to reach for, and which ones not to.
//!
//! A flat decision table mapping what a user wants to the tools that do it,
//! in the order they should be called. It also records the two operations
//! the controller cannot perform (firewall policy creation) and what to do
//! instead. The table backs the `unifi_tool_guide` tool and the server's
//! MCP instructions.

use std::collections::BTreeSet;

use serde::Serialize;
use unifi_network::firewall::CREATION_ALTERNATIVES;

/// The workflow every configuration change follows.
pub const WORKFLOW: &str = "List the current configuration first. Call the change tool \
without `confirm` to get a preview and warning, then call it again with `confirm: true` \
to apply.";

/// Whether a recommended tool works against current controllers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    /// Works as documented.
    Reliable,
    /// Always fails because of a controller defect. Use the workarounds.
    NonFunctional,
}

/// One row of the decision table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IntentGuide {
    /// What the user is trying to do.
    pub intent: &'static str,
    /// Words that suggest this intent.
    pub keywords: &'static [&'static str],
    /// Tools to call, in order.
    pub tools: &'static [&'static str],
    /// Caveats.
    pub notes: &'static str,
    /// Whether the final tool works.
    pub reliability: Reliability,
}

static ENTRIES: &[IntentGuide] = &[
    IntentGuide {
        intent: "Reserve a fixed IP address for a device",
        keywords: &["fixed ip", "static ip", "reservation", "dhcp", "reserve", "address"],
        tools: &[
            "unifi_list_dhcp_reservations",
            "unifi_list_available_ips",
            "unifi_set_client_fixed_ip",
        ],
        notes: "Use unifi_create_dhcp_reservation for devices the controller has never seen. \
                The network is detected from the IP when not given.",
        reliability: Reliability::Reliable,
    },
    IntentGuide {
        intent: "Release a fixed IP and return a device to DHCP",
        keywords: &["dhcp", "release", "remove reservation", "dynamic"],
        tools: &["unifi_get_client_fixed_ip", "unifi_remove_client_fixed_ip"],
        notes: "",
        reliability: Reliability::Reliable,
    },
    IntentGuide {
        intent: "Enable or disable a switch port",
        keywords: &["port", "switch", "disable", "enable", "shut", "isolate"],
        tools: &[
            "unifi_list_devices",
            "unifi_list_switch_ports",
            "unifi_toggle_switch_port",
        ],
        notes: "Port indexes are 0-based; port 1 is index 0.",
        reliability: Reliability::Reliable,
    },
    IntentGuide {
        intent: "Configure a switch port's PoE, profile, or name",
        keywords: &["poe", "profile", "vlan", "port", "rename", "portconf"],
        tools: &[
            "unifi_list_switch_ports",
            "unifi_list_port_profiles",
            "unifi_set_port_poe",
            "unifi_set_port_profile",
            "unifi_set_port_name",
        ],
        notes: "PoE modes are auto, passive, passthrough, and off.",
        reliability: Reliability::Reliable,
    },
    IntentGuide {
        intent: "Power-cycle a PoE device",
        keywords: &["poe", "power", "cycle", "restart", "camera", "reboot"],
        tools: &["unifi_list_switch_ports", "unifi_restart_poe_port"],
        notes: "The port loses power for a few seconds.",
        reliability: Reliability::Reliable,
    },
    IntentGuide {
        intent: "Block, unblock, or reconnect a client",
        keywords: &["block", "unblock", "kick", "reconnect", "client", "ban"],
        tools: &[
            "unifi_list_clients",
            "unifi_get_client_details",
            "unifi_block_client",
            "unifi_unblock_client",
            "unifi_reconnect_client",
        ],
        notes: "",
        reliability: Reliability::Reliable,
    },
    IntentGuide {
        intent: "Find or rename a client",
        keywords: &["client", "device", "who", "connected", "rename", "alias"],
        tools: &[
            "unifi_list_clients",
            "unifi_list_known_clients",
            "unifi_rename_client",
        ],
        notes: "",
        reliability: Reliability::Reliable,
    },
    IntentGuide {
        intent: "Route traffic for a device or network through a specific interface",
        keywords: &["route", "vpn", "traffic", "policy route", "kill switch", "domain"],
        tools: &[
            "unifi_list_networks",
            "unifi_list_traffic_routes",
            "unifi_create_traffic_route",
            "unifi_update_traffic_route",
            "unifi_toggle_traffic_route",
        ],
        notes: "Traffic routes are the working replacement for many firewall rules.",
        reliability: Reliability::Reliable,
    },
    IntentGuide {
        intent: "Isolate a VLAN from other networks",
        keywords: &["vlan", "isolate", "isolation", "segment", "iot", "guest"],
        tools: &[
            "unifi_list_networks",
            "unifi_get_network_details",
            "unifi_update_network",
        ],
        notes: "Set network_isolation_enabled to true. This replaces inter-VLAN block rules.",
        reliability: Reliability::Reliable,
    },
    IntentGuide {
        intent: "Create or change a LAN network or VLAN",
        keywords: &["network", "vlan", "subnet", "lan", "create network"],
        tools: &[
            "unifi_list_networks",
            "unifi_create_network",
            "unifi_update_network",
            "unifi_delete_network",
        ],
        notes: "Changing or deleting the WAN network can cut internet access.",
        reliability: Reliability::Reliable,
    },
    IntentGuide {
        intent: "Manage Wi-Fi networks",
        keywords: &["wifi", "wi-fi", "wlan", "ssid", "wireless", "password", "passphrase"],
        tools: &[
            "unifi_list_wlans",
            "unifi_get_wlan_details",
            "unifi_create_wlan",
            "unifi_update_wlan",
            "unifi_toggle_wlan",
            "unifi_delete_wlan",
        ],
        notes: "",
        reliability: Reliability::Reliable,
    },
    IntentGuide {
        intent: "Review, toggle, or edit existing firewall policies",
        keywords: &["firewall", "policy", "rule", "toggle", "edit", "zone", "group"],
        tools: &[
            "unifi_list_firewall_policies",
            "unifi_get_firewall_policy_details",
            "unifi_toggle_firewall_policy",
            "unifi_update_firewall_policy",
            "unifi_list_firewall_zones",
            "unifi_list_ip_groups",
        ],
        notes: "Existing policies can be changed. New ones cannot be created.",
        reliability: Reliability::Reliable,
    },
    IntentGuide {
        intent: "Create a firewall policy",
        keywords: &["firewall", "create", "new rule", "block traffic", "allow traffic"],
        tools: &["unifi_create_firewall_policy"],
        notes: "Always fails: the controller's V2 firewall API does not accept new policies. \
                Use network isolation, traffic routes, switch-port disablement, or the web UI.",
        reliability: Reliability::NonFunctional,
    },
    IntentGuide {
        intent: "Create a simple firewall rule",
        keywords: &["firewall", "simple", "create", "block", "rule"],
        tools: &["unifi_create_simple_firewall_policy"],
        notes: "Always fails for the same reason as full policy creation. Do not retry.",
        reliability: Reliability::NonFunctional,
    },
    IntentGuide {
        intent: "Check WAN and internet status",
        keywords: &["wan", "internet", "uplink", "isp", "failover", "offline", "dream machine"],
        tools: &[
            "unifi_get_wan_status",
            "unifi_check_wan_connectivity",
            "unifi_get_wan_failover_status",
            "unifi_get_dream_machine_wan_status",
        ],
        notes: "WAN tools are read-only. Change WAN settings in the web UI.",
        reliability: Reliability::Reliable,
    },
    IntentGuide {
        intent: "Restart, adopt, upgrade, or rename a UniFi device",
        keywords: &["device", "reboot", "restart", "adopt", "upgrade", "firmware", "access point"],
        tools: &[
            "unifi_list_devices",
            "unifi_get_device_details",
            "unifi_reboot_device",
            "unifi_adopt_device",
            "unifi_upgrade_device",
            "unifi_rename_device",
        ],
        notes: "",
        reliability: Reliability::Reliable,
    },
    IntentGuide {
        intent: "Check overall network health",
        keywords: &["health", "status", "sysinfo", "version", "controller"],
        tools: &["unifi_get_network_health", "unifi_get_system_info", "health"],
        notes: "",
        reliability: Reliability::Reliable,
    },
];

/// The full decision table.
pub fn entries() -> &'static [IntentGuide] {
    ENTRIES
}

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "do", "for", "how", "i", "in", "is", "it", "my", "of", "on", "or", "the",
    "to", "want",
];

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

impl IntentGuide {
    fn matches(&self, word: &str) -> bool {
        words(self.intent).any(|w| w == word)
            || self.keywords.iter().any(|k| words(k).any(|w| w == word))
    }
}

/// Entries whose intent or keywords share a word with `query`.
///
/// Case-insensitive. An empty query (or one made only of filler words)
/// returns every entry.
pub fn lookup(query: &str) -> Vec<&'static IntentGuide> {
    let terms: Vec<String> = words(query)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect();
    if terms.is_empty() {
        return ENTRIES.iter().collect();
    }
    ENTRIES
        .iter()
        .filter(|entry| terms.iter().any(|t| entry.matches(t)))
        .collect()
}

/// Every tool the table mentions.
pub fn referenced_tools() -> BTreeSet<&'static str> {
    ENTRIES.iter().flat_map(|e| e.tools.iter().copied()).collect()
}

/// Tools that always fail.
pub fn non_functional_tools() -> BTreeSet<&'static str> {
    ENTRIES
        .iter()
        .filter(|e| e.reliability == Reliability::NonFunctional)
        .flat_map(|e| e.tools.iter().copied())
        .collect()
}

/// Text for the MCP `instructions` field.
pub fn instructions() -> String {
    let mut text = format!("UniFi Network controller tools.\n\nWorkflow: {WORKFLOW}\n\n");
    text.push_str("Do not use these tools, they always fail:\n");
    for tool in non_functional_tools() {
        text.push_str(&format!("- {tool}\n"));
    }
    text.push_str("\nInstead:\n");
    for (_, how) in CREATION_ALTERNATIVES {
        text.push_str(&format!("- {how}\n"));
    }
    text.push_str("\nCall unifi_tool_guide with a short description of the task to find the right tools.");
    text
}
