//! Connect/roam orchestration and tracking of the selected network.

use std::sync::Arc;

use tracing::{debug, warn};

use supplicant_protocol::{INVALID_NETWORK_ID, NetworkConfigRecord};

use crate::error::{Error, Result};
use crate::network::NetworkHandle;
use crate::remote::StationInterface;
use crate::rpc;
use crate::session::Session;

/// Tracks which daemon-side network is currently selected, keyed by the
/// caller's framework network id. The handle is present iff the id is
/// valid; both reset together, never independently.
pub(crate) struct ConnectionOrchestrator {
    framework_network_id: i32,
    current: Option<NetworkHandle>,
}

impl ConnectionOrchestrator {
    pub fn new() -> Self {
        Self {
            framework_network_id: INVALID_NETWORK_ID,
            current: None,
        }
    }

    pub fn framework_network_id(&self) -> i32 {
        self.framework_network_id
    }

    fn clear(&mut self) {
        self.framework_network_id = INVALID_NETWORK_ID;
        self.current = None;
    }

    /// Configures and selects `record` on the daemon:
    /// 1. disconnect (when `should_disconnect`),
    /// 2. remove every existing network entry,
    /// 3. add a fresh entry and save the configuration into it,
    /// 4. select it.
    ///
    /// Tracking is cleared before any remote work, so a failed attempt can
    /// never leave a stale network observable. Remove-then-add guarantees
    /// the daemon holds no conflicting entries from a previous session, at
    /// the cost of re-sending the full configuration every time.
    pub async fn connect(
        &mut self,
        session: &Session,
        record: &NetworkConfigRecord,
        should_disconnect: bool,
    ) -> Result<()> {
        self.clear();
        debug!(config_key = %record.config_key(), should_disconnect, "connectToNetwork");
        let (id, handle) = self
            .connect_steps(session, record, should_disconnect)
            .await
            .map_err(|step| {
                warn!(config_key = %record.config_key(), error = %step, "connect sequence failed");
                Error::aborted("connectToNetwork", step)
            })?;
        self.framework_network_id = id;
        self.current = Some(handle);
        Ok(())
    }

    async fn connect_steps(
        &self,
        session: &Session,
        record: &NetworkConfigRecord,
        should_disconnect: bool,
    ) -> Result<(i32, NetworkHandle)> {
        let station = session.station()?;
        if should_disconnect {
            rpc::expect("disconnect", station.disconnect().await)?;
        }
        remove_all_networks(&station).await?;
        let iface = rpc::expect("addNetwork", station.add_network().await)?;
        let handle = NetworkHandle::new(iface);
        handle.save_configuration(record).await?;
        handle.select().await?;
        Ok((record.network_id, handle))
    }

    /// Moves the association to `record`'s BSSID without touching the
    /// network entry itself, which is the entire reason roam is cheaper
    /// than connect. When `record` does not match the tracked network this
    /// is not a roam: it falls back to a fresh connection.
    pub async fn roam(
        &mut self,
        session: &Session,
        record: &NetworkConfigRecord,
    ) -> Result<()> {
        match &self.current {
            Some(handle) if self.framework_network_id == record.network_id => {
                debug!(config_key = %record.config_key(), bssid = ?record.bssid, "roamToNetwork");
                let steps = async {
                    handle.set_bssid(record.bssid.as_deref()).await?;
                    let station = session.station()?;
                    rpc::expect("reassociate", station.reassociate().await)
                };
                steps.await.map_err(|step| {
                    warn!(config_key = %record.config_key(), error = %step, "roam sequence failed");
                    Error::aborted("roamToNetwork", step)
                })
            }
            _ => {
                warn!(
                    tracked = self.framework_network_id,
                    requested = record.network_id,
                    "cannot roam to a different network; initiating fresh connection"
                );
                self.connect(session, record, false).await
            }
        }
    }
}

/// Removes every network entry currently on the daemon. First failure
/// aborts, leaving later entries in place.
pub(crate) async fn remove_all_networks(station: &Arc<dyn StationInterface>) -> Result<()> {
    let ids = rpc::expect("listNetworks", station.list_networks().await)?;
    for id in ids {
        rpc::expect("removeNetwork", station.remove_network(id).await)?;
    }
    Ok(())
}
