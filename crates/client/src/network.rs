//! Handle for one daemon-side network entry.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, warn};

use supplicant_protocol::{
    EXTRAS_KEY_CONFIG_KEY, INVALID_NETWORK_ID, NetworkConfigRecord, NetworkId, param,
};

use crate::error::{Error, Result};
use crate::remote::NetworkInterface;
use crate::rpc;

/// One network entry owned by the daemon, bound at creation to its
/// daemon-side id. Pushes and pulls whole [`NetworkConfigRecord`]s through
/// the entry's per-parameter operations.
pub struct NetworkHandle {
    remote_id: NetworkId,
    iface: Arc<dyn NetworkInterface>,
}

impl NetworkHandle {
    pub fn new(iface: Arc<dyn NetworkInterface>) -> Self {
        Self {
            remote_id: iface.id(),
            iface,
        }
    }

    pub fn remote_id(&self) -> NetworkId {
        self.remote_id
    }

    /// Pushes every field of `record` to the remote entry, then the extras
    /// map (with the configuration key inserted) as the metadata blob.
    ///
    /// The first failing push aborts. The remote side offers no
    /// transaction, so parameters written before the failure remain on the
    /// entry; callers discard the entry rather than rely on its contents.
    pub async fn save_configuration(&self, record: &NetworkConfigRecord) -> Result<()> {
        debug!(remote_id = self.remote_id, config_key = %record.config_key(), "saving configuration");
        rpc::expect(
            "setParameter",
            self.iface.set_parameter(param::SSID, &record.ssid).await,
        )?;
        rpc::expect(
            "setParameter",
            self.iface
                .set_parameter(param::SECURITY, &record.security)
                .await,
        )?;
        if let Some(bssid) = record.bssid.as_deref() {
            rpc::expect("setBssid", self.iface.set_bssid(Some(bssid)).await)?;
        }
        for (name, value) in &record.fields {
            debug!(remote_id = self.remote_id, field = %name, "pushing field");
            rpc::expect("setParameter", self.iface.set_parameter(name, value).await)?;
        }

        let mut extras = record.extras.clone();
        extras.insert(EXTRAS_KEY_CONFIG_KEY.to_string(), record.config_key());
        rpc::expect(
            "setMetadata",
            self.iface.set_metadata(&encode_extras(&extras)).await,
        )?;
        Ok(())
    }

    /// Pulls the configuration back from the remote entry, reconstructing
    /// the record and its extras. SSID and security are required; tracked
    /// optional parameters are included when set.
    pub async fn load_configuration(&self) -> Result<(NetworkConfigRecord, HashMap<String, String>)> {
        let ssid = rpc::expect("getParameter", self.iface.get_parameter(param::SSID).await)?
            .ok_or(Error::MalformedReply("getParameter(ssid)"))?;
        let security = rpc::expect(
            "getParameter",
            self.iface.get_parameter(param::SECURITY).await,
        )?
        .ok_or(Error::MalformedReply("getParameter(key_mgmt)"))?;
        let bssid = rpc::expect("getParameter", self.iface.get_parameter(param::BSSID).await)?;

        let mut fields = BTreeMap::new();
        for name in param::TRACKED {
            if let Some(value) =
                rpc::expect("getParameter", self.iface.get_parameter(name).await)?
            {
                fields.insert((*name).to_string(), value);
            }
        }

        let extras = match rpc::expect("getMetadata", self.iface.get_metadata().await)? {
            None => HashMap::new(),
            Some(blob) => decode_extras(self.remote_id, &blob),
        };

        let record = NetworkConfigRecord {
            network_id: INVALID_NETWORK_ID,
            ssid,
            security,
            bssid,
            fields,
            extras: extras.clone(),
            ..NetworkConfigRecord::default()
        };
        Ok((record, extras))
    }

    /// Marks this network as the one the daemon should associate with.
    pub async fn select(&self) -> Result<()> {
        rpc::expect("select", self.iface.select().await)
    }

    /// `None` clears the constraint: associate with any BSSID.
    pub async fn set_bssid(&self, bssid: Option<&str>) -> Result<()> {
        rpc::expect("setBssid", self.iface.set_bssid(bssid).await)
    }
}

pub(crate) fn encode_extras(extras: &HashMap<String, String>) -> String {
    serde_json::Value::Object(
        extras
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect(),
    )
    .to_string()
}

fn decode_extras(remote_id: NetworkId, blob: &str) -> HashMap<String, String> {
    match serde_json::from_str(blob) {
        Ok(extras) => extras,
        Err(error) => {
            // Tolerated: a corrupt blob loses the extras, not the record.
            warn!(remote_id, %error, "metadata blob is not a string map; ignoring");
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extras_encoding_round_trips() {
        let mut extras = HashMap::new();
        extras.insert("configKey".to_string(), "\"Lab\"-WPA_PSK".to_string());
        extras.insert("fqdn".to_string(), "lab.example.com".to_string());

        let decoded = decode_extras(0, &encode_extras(&extras));
        assert_eq!(decoded, extras);
    }

    #[test]
    fn corrupt_metadata_decodes_to_empty() {
        assert!(decode_extras(0, "not json").is_empty());
        assert!(decode_extras(0, "[1,2,3]").is_empty());
    }
}
