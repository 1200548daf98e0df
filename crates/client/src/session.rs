//! Session state: the daemon interface handles and their acquisition.

use std::sync::Arc;

use tracing::{error, warn};

use supplicant_protocol::InterfaceType;

use crate::error::{Error, Result};
use crate::remote::{RootInterface, ServiceRegistry, StationInterface};
use crate::rpc;

/// Handles onto the live daemon. All-absent until an availability
/// notification triggers acquisition; reset to all-absent on any detected
/// daemon death. Lives inside the client's single lock, and nothing
/// outside this module mutates the fields.
pub(crate) struct Session {
    root: Option<Arc<dyn RootInterface>>,
    station: Option<Arc<dyn StationInterface>>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            root: None,
            station: None,
        }
    }

    /// Obtains the root handle via the registry lookup. On any failure the
    /// root stays absent.
    pub async fn acquire_root_interface(
        &mut self,
        registry: &dyn ServiceRegistry,
        name: &str,
    ) -> Result<()> {
        self.root = None;
        match registry.lookup_root_interface(name).await {
            Err(fault) => {
                error!(service = name, %fault, "root interface lookup failed to deliver");
                Err(Error::TransportFault(fault.0))
            }
            Ok(None) => {
                error!(service = name, "registry returned no root interface");
                Err(Error::InterfaceUnavailable("root"))
            }
            Ok(Some(root)) => {
                self.root = Some(root);
                Ok(())
            }
        }
    }

    /// Enumerates the root's interfaces and resolves the first
    /// station-typed entry into a typed handle. First match wins and
    /// iteration stops; if that one resolution is rejected, acquisition
    /// fails.
    pub async fn acquire_station_interface(&mut self) -> Result<()> {
        self.station = None;
        let root = self
            .root
            .clone()
            .ok_or(Error::InterfaceUnavailable("root"))?;

        let interfaces = rpc::expect("listInterfaces", root.list_interfaces().await)?;
        if interfaces.is_empty() {
            error!("daemon exposes zero interfaces");
            return Err(Error::InterfaceUnavailable("station"));
        }
        let Some(info) = interfaces
            .iter()
            .find(|info| info.iface_type == InterfaceType::Station)
        else {
            error!("daemon exposes no station interface");
            return Err(Error::InterfaceUnavailable("station"));
        };

        let station = rpc::expect("getInterface", root.get_interface(info).await)?;
        self.station = Some(station);
        Ok(())
    }

    /// True iff the station handle is present.
    pub fn is_ready(&self) -> bool {
        self.station.is_some()
    }

    /// The station handle, or the precondition failure every remote
    /// operation checks for before invoking anything.
    pub fn station(&self) -> Result<Arc<dyn StationInterface>> {
        self.station.clone().ok_or_else(|| {
            warn!("station interface not acquired");
            Error::InterfaceUnavailable("station")
        })
    }

    /// Drops both handles. Idempotent.
    pub fn on_daemon_death(&mut self) {
        self.root = None;
        self.station = None;
    }
}
