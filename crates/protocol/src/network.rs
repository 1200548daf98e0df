//! Network configuration records and related identifiers.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Daemon-side identity of a network entry. Only meaningful within one
/// daemon lifetime; never reused across restarts.
pub type NetworkId = u32;

/// Sentinel for "no network tracked" on the caller side.
pub const INVALID_NETWORK_ID: i32 = -1;

/// Extras key under which the derived configuration key is stored on the
/// daemon, so it round-trips through the metadata field.
pub const EXTRAS_KEY_CONFIG_KEY: &str = "configKey";

/// Well-known parameter names pushed to and pulled from a network entry.
///
/// The set of optional parameters a load attempts to pull back is
/// [`param::TRACKED`]; anything else a caller stores still round-trips
/// through the record's `fields` map on save.
pub mod param {
    pub const SSID: &str = "ssid";
    pub const SECURITY: &str = "key_mgmt";
    pub const BSSID: &str = "bssid";
    pub const PSK: &str = "psk";
    pub const PRIORITY: &str = "priority";
    pub const SCAN_SSID: &str = "scan_ssid";
    pub const REQUIRE_PMF: &str = "require_pmf";

    /// Optional parameters reconstructed by a configuration load.
    pub const TRACKED: &[&str] = &[PSK, PRIORITY, SCAN_SSID, REQUIRE_PMF];
}

/// Client-side address assignment policy attached to a loaded record.
/// Not read from the daemon; the catalog applies the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpAssignment {
    #[default]
    Dhcp,
    Static,
}

/// Client-side proxy policy attached to a loaded record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxySettings {
    #[default]
    None,
    Static,
    Pac,
}

/// RX filter kinds accepted by the station interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RxFilterType {
    V4Multicast,
    V6Multicast,
}

/// Bluetooth coexistence modes accepted by the station interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BtCoexMode {
    Enabled,
    Disabled,
    Sense,
}

/// One logical network configuration as seen by callers.
///
/// Produced and consumed as plain data; persistence is the host's concern.
/// `fields` holds the named attributes pushed verbatim to the daemon;
/// `extras` holds out-of-band metadata not representable in the remote
/// schema, round-tripped through the entry's metadata field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfigRecord {
    /// Caller-side identity, distinct from the daemon's network id.
    pub network_id: i32,
    pub ssid: String,
    /// Security scheme, e.g. `WPA_PSK` or `NONE`. Part of the dedup key.
    pub security: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bssid: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub extras: HashMap<String, String>,
    #[serde(default)]
    pub ip_assignment: IpAssignment,
    #[serde(default)]
    pub proxy_settings: ProxySettings,
}

impl NetworkConfigRecord {
    pub fn new(network_id: i32, ssid: impl Into<String>, security: impl Into<String>) -> Self {
        Self {
            network_id,
            ssid: ssid.into(),
            security: security.into(),
            ..Self::default()
        }
    }

    /// Unique key identifying this logical configuration, derived from
    /// SSID and security scheme. Two records with the same key are the
    /// same network as far as deduplication is concerned.
    pub fn config_key(&self) -> String {
        format!("\"{}\"-{}", self.ssid, self.security)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_key_combines_ssid_and_security() {
        let record = NetworkConfigRecord::new(3, "CoffeeShop", "WPA_PSK");
        assert_eq!(record.config_key(), "\"CoffeeShop\"-WPA_PSK");
    }

    #[test]
    fn same_ssid_different_security_yields_distinct_keys() {
        let open = NetworkConfigRecord::new(1, "Lounge", "NONE");
        let psk = NetworkConfigRecord::new(2, "Lounge", "WPA_PSK");
        assert_ne!(open.config_key(), psk.config_key());
    }

    #[test]
    fn defaults_are_dhcp_and_no_proxy() {
        let record = NetworkConfigRecord::new(1, "Lounge", "NONE");
        assert_eq!(record.ip_assignment, IpAssignment::Dhcp);
        assert_eq!(record.proxy_settings, ProxySettings::None);
    }

    #[test]
    fn record_round_trips_through_json() {
        let mut record = NetworkConfigRecord::new(7, "Lab", "WPA_PSK");
        record.fields.insert(param::PSK.into(), "hunter22".into());
        record.extras.insert("fqdn".into(), "lab.example.com".into());

        let encoded = serde_json::to_string(&record).unwrap();
        let decoded: NetworkConfigRecord = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, record);
    }
}
