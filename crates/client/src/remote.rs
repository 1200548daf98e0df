//! External-collaborator traits: the service registry and the daemon's
//! interfaces.
//!
//! The concrete transport is opaque to this crate. An implementation hands
//! out handles as trait objects; every remote method returns a
//! [`CallResult`] so the caller can tell a delivery fault (daemon possibly
//! dead) from a logical rejection (daemon alive and said no).
//!
//! Registry notifications do not use callbacks: registrations take the
//! sending half of an event channel, and [`crate::StaIfaceClient::run`]
//! consumes the receiving half, serializing notifications against
//! in-flight operations.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use supplicant_protocol::{
    BtCoexMode, CallResult, InterfaceInfo, NetworkId, RegistryEvent, RxFilterType, TransportFault,
};

/// Name under which the daemon's root interface registers by default.
pub const DEFAULT_SERVICE_NAME: &str = "supplicant";

/// Discovery facility through which the daemon's root interface is found
/// and whose death and service availability can be observed.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Looks up the daemon's root interface. `Ok(None)` means the service
    /// is not currently registered; a fault means the registry call itself
    /// failed to deliver.
    async fn lookup_root_interface(
        &self,
        name: &str,
    ) -> Result<Option<Arc<dyn RootInterface>>, TransportFault>;

    /// Registers for notification of the registry's own death. Returns
    /// false when the registry cannot be reached at all.
    async fn register_death_notification(
        &self,
        events: mpsc::UnboundedSender<RegistryEvent>,
    ) -> bool;

    /// Registers for notification of `name` becoming available. Returns
    /// false when the registry cannot be reached at all.
    async fn register_availability_notification(
        &self,
        name: &str,
        events: mpsc::UnboundedSender<RegistryEvent>,
    ) -> bool;
}

/// The daemon's root interface: enumerates the interfaces it exposes and
/// resolves enumeration entries into typed handles.
#[async_trait]
pub trait RootInterface: Send + Sync {
    async fn list_interfaces(&self) -> CallResult<Vec<InterfaceInfo>>;

    async fn get_interface(&self, info: &InterfaceInfo) -> CallResult<Arc<dyn StationInterface>>;
}

/// Per-device interface exposing network management and control
/// operations. All MAC addresses are colon-separated hex strings; their
/// parsing is the transport's concern.
#[async_trait]
pub trait StationInterface: Send + Sync {
    async fn add_network(&self) -> CallResult<Arc<dyn NetworkInterface>>;
    async fn remove_network(&self, id: NetworkId) -> CallResult<()>;
    async fn get_network(&self, id: NetworkId) -> CallResult<Arc<dyn NetworkInterface>>;
    async fn list_networks(&self) -> CallResult<Vec<NetworkId>>;

    async fn disconnect(&self) -> CallResult<()>;
    async fn reconnect(&self) -> CallResult<()>;
    async fn reassociate(&self) -> CallResult<()>;

    async fn set_power_save(&self, enable: bool) -> CallResult<()>;
    async fn set_suspend_mode(&self, enable: bool) -> CallResult<()>;
    async fn set_country_code(&self, code: &str) -> CallResult<()>;
    async fn get_mac_address(&self) -> CallResult<String>;

    async fn start_rx_filter(&self) -> CallResult<()>;
    async fn stop_rx_filter(&self) -> CallResult<()>;
    async fn add_rx_filter(&self, filter: RxFilterType) -> CallResult<()>;
    async fn remove_rx_filter(&self, filter: RxFilterType) -> CallResult<()>;

    async fn set_bt_coexistence_mode(&self, mode: BtCoexMode) -> CallResult<()>;
    async fn set_bt_coexistence_scan_mode(&self, enable: bool) -> CallResult<()>;

    async fn initiate_tdls_discover(&self, peer: &str) -> CallResult<()>;
    async fn initiate_tdls_setup(&self, peer: &str) -> CallResult<()>;
    async fn initiate_tdls_teardown(&self, peer: &str) -> CallResult<()>;

    async fn initiate_anqp_query(
        &self,
        bssid: &str,
        info_elements: &[u16],
        hs20_subtypes: &[u32],
    ) -> CallResult<()>;
    async fn initiate_hs20_icon_query(&self, bssid: &str, file_name: &str) -> CallResult<()>;
}

/// One network entry owned by the daemon, bound to its daemon-side id at
/// creation. The handle is implicitly invalidated when the daemon dies;
/// its id is never reused across daemon restarts.
#[async_trait]
pub trait NetworkInterface: Send + Sync {
    /// Daemon-side id of this entry. A handle attribute, not a remote call.
    fn id(&self) -> NetworkId;

    async fn set_parameter(&self, name: &str, value: &str) -> CallResult<()>;
    /// `Ok` with `None` payload value means the parameter is unset.
    async fn get_parameter(&self, name: &str) -> CallResult<Option<String>>;

    /// Stores the opaque metadata blob (out-of-band data not representable
    /// in the remote schema).
    async fn set_metadata(&self, blob: &str) -> CallResult<()>;
    async fn get_metadata(&self) -> CallResult<Option<String>>;

    /// `None` clears the constraint: associate with any BSSID.
    async fn set_bssid(&self, bssid: Option<&str>) -> CallResult<()>;

    /// Marks this entry as the one the daemon should associate with.
    async fn select(&self) -> CallResult<()>;
}
