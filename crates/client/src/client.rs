//! Host-facing client: registry watching, session lifecycle, and the
//! operation surface.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

use supplicant_protocol::{
    BtCoexMode, NetworkConfigRecord, NetworkId, RegistryEvent, RxFilterType,
};

use crate::catalog;
use crate::error::{Error, Result};
use crate::orchestrator::{self, ConnectionOrchestrator};
use crate::remote::{DEFAULT_SERVICE_NAME, ServiceRegistry, StationInterface};
use crate::rpc;
use crate::session::Session;

/// Everything guarded by the client's single lock. Public operations hold
/// the lock for their full duration, so remote-call sequences never
/// interleave and a death notification cannot tear a running sequence.
struct ClientState {
    session: Session,
    orchestrator: ConnectionOrchestrator,
    /// Registry notifications registered and still valid. Cleared when the
    /// registry dies so a later `initialize` re-registers.
    registry_armed: bool,
}

impl ClientState {
    fn station(&self) -> Result<Arc<dyn StationInterface>> {
        self.session.station()
    }

    /// Applies the death-handling policy at the operation boundary: any
    /// transport fault in the error chain means the daemon is gone.
    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(error) = &result {
            if error.involves_transport_fault() {
                warn!(%error, "transport fault; treating daemon as dead");
                self.session.on_daemon_death();
            }
        }
        result
    }
}

/// Client for a supplicant daemon discovered through a service registry.
///
/// Construct one per process, call [`initialize`](Self::initialize), and
/// spawn [`run`](Self::run) in a background task to consume registry
/// notifications. Operations fail with
/// [`Error::InterfaceUnavailable`] until the daemon's station interface
/// has been acquired; [`is_initialization_complete`](Self::is_initialization_complete)
/// reports that state.
///
/// No operation is cancellable once started and none retries: every
/// failure surfaces to the caller, and retry policy is the caller's.
pub struct StaIfaceClient {
    registry: Arc<dyn ServiceRegistry>,
    service_name: String,
    events_tx: mpsc::UnboundedSender<RegistryEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<RegistryEvent>>>,
    state: Mutex<ClientState>,
}

impl StaIfaceClient {
    pub fn new(registry: Arc<dyn ServiceRegistry>) -> Self {
        Self::with_service_name(registry, DEFAULT_SERVICE_NAME)
    }

    /// Watches `service_name` instead of [`DEFAULT_SERVICE_NAME`].
    pub fn with_service_name(
        registry: Arc<dyn ServiceRegistry>,
        service_name: impl Into<String>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            registry,
            service_name: service_name.into(),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            state: Mutex::new(ClientState {
                session: Session::new(),
                orchestrator: ConnectionOrchestrator::new(),
                registry_armed: false,
            }),
        }
    }

    /// Registers the registry death notification and the availability
    /// notification for the daemon's root interface. Idempotent: when the
    /// registrations are already armed this is a no-op success. Fails only
    /// when the registry itself cannot be reached, which is fatal rather
    /// than transient.
    pub async fn initialize(&self) -> Result<()> {
        debug!(service = %self.service_name, "registering service notifications");
        let mut state = self.state.lock().await;
        state.session.on_daemon_death();
        if state.registry_armed {
            return Ok(());
        }
        if !self
            .registry
            .register_death_notification(self.events_tx.clone())
            .await
        {
            error!("failed to register registry death notification");
            return Err(Error::RegistryUnavailable);
        }
        if !self
            .registry
            .register_availability_notification(&self.service_name, self.events_tx.clone())
            .await
        {
            error!(service = %self.service_name, "failed to register availability notification");
            return Err(Error::RegistryUnavailable);
        }
        state.registry_armed = true;
        Ok(())
    }

    /// Consumes registry notifications until the channel closes. Spawn in
    /// a background task after construction.
    pub async fn run(&self) {
        let mut events = self
            .events_rx
            .lock()
            .await
            .take()
            .expect("run() can only be called once");

        while let Some(event) = events.recv().await {
            match event {
                RegistryEvent::ServiceAvailable { name, preexisting } => {
                    debug!(%name, preexisting, "service available");
                    self.handle_service_available().await;
                }
                RegistryEvent::RegistryDied => {
                    warn!("service registry died");
                    self.handle_registry_death().await;
                }
            }
        }
        debug!("registry event loop ended");
    }

    async fn handle_service_available(&self) {
        let mut state = self.state.lock().await;
        let acquired = match state
            .session
            .acquire_root_interface(self.registry.as_ref(), &self.service_name)
            .await
        {
            Ok(()) => state.session.acquire_station_interface().await,
            Err(error) => Err(error),
        };
        match acquired {
            Ok(()) => info!("daemon session initialized"),
            Err(error) => {
                // Failure to come up is indistinguishable from death.
                error!(%error, "initializing daemon interfaces failed");
                state.session.on_daemon_death();
            }
        }
    }

    async fn handle_registry_death(&self) {
        let mut state = self.state.lock().await;
        state.session.on_daemon_death();
        state.registry_armed = false;
    }

    /// True once the station interface has been acquired.
    pub async fn is_initialization_complete(&self) -> bool {
        self.state.lock().await.session.is_ready()
    }

    /// Framework id of the currently tracked network, or the invalid
    /// sentinel when none is tracked.
    pub async fn current_network_id(&self) -> i32 {
        self.state.lock().await.orchestrator.framework_network_id()
    }

    /// Configures `record` on the daemon and initiates a connection to it.
    /// See [`ConnectionOrchestrator::connect`] for the step sequence.
    pub async fn connect_to_network(
        &self,
        record: &NetworkConfigRecord,
        should_disconnect: bool,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let result = {
            let ClientState {
                session,
                orchestrator,
                ..
            } = &mut *state;
            orchestrator.connect(session, record, should_disconnect).await
        };
        state.settle(result)
    }

    /// Roams to `record`'s BSSID when it matches the tracked network,
    /// otherwise falls back to a fresh connection.
    pub async fn roam_to_network(&self, record: &NetworkConfigRecord) -> Result<()> {
        let mut state = self.state.lock().await;
        let result = {
            let ClientState {
                session,
                orchestrator,
                ..
            } = &mut *state;
            orchestrator.roam(session, record).await
        };
        state.settle(result)
    }

    /// Loads all networks known to the daemon, deduplicated by
    /// configuration key. Returns the records keyed by configuration key
    /// and the extras of each surviving entry keyed by daemon-side id.
    pub async fn load_networks(
        &self,
    ) -> Result<(
        HashMap<String, NetworkConfigRecord>,
        HashMap<NetworkId, HashMap<String, String>>,
    )> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let result = catalog::load_all(&station).await;
        state.settle(result)
    }

    /// Removes every network entry currently on the daemon.
    pub async fn remove_all_networks(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let result = orchestrator::remove_all_networks(&station).await;
        state.settle(result)
    }

    /// Triggers a disconnection from the currently connected network.
    pub async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.disconnect().await;
        state.settle(rpc::expect("disconnect", outcome))
    }

    /// Triggers a reconnection if the interface is disconnected.
    pub async fn reconnect(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.reconnect().await;
        state.settle(rpc::expect("reconnect", outcome))
    }

    /// Triggers a reassociation even while connected.
    pub async fn reassociate(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.reassociate().await;
        state.settle(rpc::expect("reassociate", outcome))
    }

    pub async fn set_power_save(&self, enable: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.set_power_save(enable).await;
        state.settle(rpc::expect("setPowerSave", outcome))
    }

    /// Enables or disables suspend-mode optimizations.
    pub async fn set_suspend_mode(&self, enable: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.set_suspend_mode(enable).await;
        state.settle(rpc::expect("setSuspendMode", outcome))
    }

    /// Sets the regulatory country code, a two-letter ASCII string.
    pub async fn set_country_code(&self, code: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.set_country_code(code).await;
        state.settle(rpc::expect("setCountryCode", outcome))
    }

    pub async fn get_mac_address(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.get_mac_address().await;
        state.settle(rpc::expect("getMacAddress", outcome))
    }

    /// Starts using the previously added RX filters.
    pub async fn start_rx_filter(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.start_rx_filter().await;
        state.settle(rpc::expect("startRxFilter", outcome))
    }

    pub async fn stop_rx_filter(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.stop_rx_filter().await;
        state.settle(rpc::expect("stopRxFilter", outcome))
    }

    pub async fn add_rx_filter(&self, filter: RxFilterType) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.add_rx_filter(filter).await;
        state.settle(rpc::expect("addRxFilter", outcome))
    }

    pub async fn remove_rx_filter(&self, filter: RxFilterType) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.remove_rx_filter(filter).await;
        state.settle(rpc::expect("removeRxFilter", outcome))
    }

    pub async fn set_bt_coexistence_mode(&self, mode: BtCoexMode) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.set_bt_coexistence_mode(mode).await;
        state.settle(rpc::expect("setBtCoexistenceMode", outcome))
    }

    pub async fn set_bt_coexistence_scan_mode(&self, enable: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.set_bt_coexistence_scan_mode(enable).await;
        state.settle(rpc::expect("setBtCoexistenceScanMode", outcome))
    }

    /// Initiates TDLS discovery with the peer at `peer_mac`.
    pub async fn initiate_tdls_discover(&self, peer_mac: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.initiate_tdls_discover(peer_mac).await;
        state.settle(rpc::expect("initiateTdlsDiscover", outcome))
    }

    /// Initiates TDLS setup with the peer at `peer_mac`.
    pub async fn initiate_tdls_setup(&self, peer_mac: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.initiate_tdls_setup(peer_mac).await;
        state.settle(rpc::expect("initiateTdlsSetup", outcome))
    }

    /// Initiates TDLS teardown with the peer at `peer_mac`.
    pub async fn initiate_tdls_teardown(&self, peer_mac: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.initiate_tdls_teardown(peer_mac).await;
        state.settle(rpc::expect("initiateTdlsTeardown", outcome))
    }

    /// Requests the given ANQP elements and Hotspot 2.0 subtypes from the
    /// AP at `bssid`.
    pub async fn initiate_anqp_query(
        &self,
        bssid: &str,
        info_elements: &[u16],
        hs20_subtypes: &[u32],
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station
            .initiate_anqp_query(bssid, info_elements, hs20_subtypes)
            .await;
        state.settle(rpc::expect("initiateAnqpQuery", outcome))
    }

    /// Requests the named Hotspot 2.0 icon file from the AP at `bssid`.
    pub async fn initiate_hs20_icon_query(&self, bssid: &str, file_name: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let station = state.station()?;
        let outcome = station.initiate_hs20_icon_query(bssid, file_name).await;
        state.settle(rpc::expect("initiateHs20IconQuery", outcome))
    }
}
