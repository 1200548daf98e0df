//! Enumeration and deduplication of the daemon's network entries.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use supplicant_protocol::{
    EXTRAS_KEY_CONFIG_KEY, IpAssignment, NetworkConfigRecord, NetworkId, ProxySettings,
};

use crate::error::{Error, Result};
use crate::network::NetworkHandle;
use crate::remote::StationInterface;
use crate::rpc;

/// Loaded catalog: one record per distinct configuration key, plus the
/// extras of every surviving entry keyed by its daemon-side id.
pub(crate) type Catalog = (
    HashMap<String, NetworkConfigRecord>,
    HashMap<NetworkId, HashMap<String, String>>,
);

/// Loads every network known to the daemon into caller-visible records.
///
/// Entries sharing a configuration key collapse to the one seen last in
/// enumeration order; the losing entry is removed from the daemon, not
/// just dropped, so stale duplicates cannot persist. Fails on the first
/// enumeration or load error; no partial catalog is returned.
pub(crate) async fn load_all(station: &Arc<dyn StationInterface>) -> Result<Catalog> {
    let ids = rpc::expect("listNetworks", station.list_networks().await)?;
    let mut records: HashMap<String, (NetworkId, NetworkConfigRecord)> = HashMap::new();
    let mut extras_by_id: HashMap<NetworkId, HashMap<String, String>> = HashMap::new();

    for id in ids {
        let iface = rpc::expect("getNetwork", station.get_network(id).await)?;
        let handle = NetworkHandle::new(iface);
        let (mut record, extras) = handle.load_configuration().await?;

        // Addressing policy is a client-side default, never read back.
        record.ip_assignment = IpAssignment::Dhcp;
        record.proxy_settings = ProxySettings::None;

        let config_key = extras
            .get(EXTRAS_KEY_CONFIG_KEY)
            .cloned()
            .unwrap_or_else(|| record.config_key());
        extras_by_id.insert(id, extras);

        if let Some((stale_id, _)) = records.insert(config_key.clone(), (id, record)) {
            info!(config_key = %config_key, stale_id, winner_id = id, "replacing duplicate network");
            extras_by_id.remove(&stale_id);
            match rpc::expect("removeNetwork", station.remove_network(stale_id).await) {
                Ok(()) => {}
                Err(error @ Error::TransportFault(_)) => return Err(error),
                Err(error) => {
                    // Rejection tolerated: the entry may already be gone.
                    warn!(stale_id, %error, "failed to remove stale duplicate");
                }
            }
        }
    }

    Ok((
        records
            .into_iter()
            .map(|(key, (_, record))| (key, record))
            .collect(),
        extras_by_id,
    ))
}
