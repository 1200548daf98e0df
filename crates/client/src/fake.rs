//! In-memory fake registry and daemon for exercising the client without a
//! transport.
//!
//! The fake plays both roles: it implements [`ServiceRegistry`] and hands
//! out root/station/network handles backed by one shared state. A
//! [`FakeSupplicantController`] drives the scenario from the outside:
//! announce or kill the service, script one-shot rejections and delivery
//! faults per method, seed network entries, and inspect the recorded call
//! log.
//!
//! # Example
//!
//! ```ignore
//! let (registry, daemon) = FakeSupplicantBuilder::new().build();
//! let client = Arc::new(StaIfaceClient::new(registry));
//! tokio::spawn({
//!     let client = Arc::clone(&client);
//!     async move { client.run().await }
//! });
//! client.initialize().await?;
//! daemon.announce_service();
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use supplicant_protocol::{
    BtCoexMode, CallReply, CallResult, EXTRAS_KEY_CONFIG_KEY, InterfaceInfo, InterfaceType,
    NetworkConfigRecord, NetworkId, RegistryEvent, RxFilterType, StatusCode, TransportFault, param,
};

use crate::network::encode_extras;
use crate::remote::{NetworkInterface, RootInterface, ServiceRegistry, StationInterface};

#[derive(Default)]
struct FakeNetworkEntry {
    params: BTreeMap<String, String>,
    metadata: Option<String>,
    bssid: Option<String>,
}

struct DaemonState {
    alive: bool,
    registry_reachable: bool,
    interfaces: Vec<InterfaceInfo>,
    networks: BTreeMap<NetworkId, FakeNetworkEntry>,
    next_network_id: NetworkId,
    selected: Option<NetworkId>,
    calls: Vec<String>,
    rejections: HashMap<String, StatusCode>,
    faulted: HashSet<String>,
    death_listeners: Vec<mpsc::UnboundedSender<RegistryEvent>>,
    availability_listeners: Vec<(String, mpsc::UnboundedSender<RegistryEvent>)>,
}

impl DaemonState {
    /// Records the call and applies scripted behavior: a dead daemon
    /// faults everything, then one-shot faults, then one-shot rejections.
    fn begin<T>(&mut self, call: String, method: &str) -> Option<CallResult<T>> {
        self.calls.push(call);
        if !self.alive {
            return Some(Err(TransportFault::new("daemon not running")));
        }
        if self.faulted.remove(method) {
            return Some(Err(TransportFault::new(format!("{method}: delivery failed"))));
        }
        if let Some(status) = self.rejections.remove(method) {
            return Some(Ok(CallReply::failure(status, format!("{method} rejected"))));
        }
        None
    }
}

type SharedState = Arc<Mutex<DaemonState>>;

fn unit_call(state: &SharedState, call: String, method: &str) -> CallResult<()> {
    let mut s = state.lock();
    if let Some(out) = s.begin(call, method) {
        return out;
    }
    Ok(CallReply::success(()))
}

/// Builder for the fake. By default the daemon is alive, the registry is
/// reachable, and the root exposes a single station interface `wlan0`.
pub struct FakeSupplicantBuilder {
    interfaces: Vec<InterfaceInfo>,
    registry_reachable: bool,
}

impl FakeSupplicantBuilder {
    pub fn new() -> Self {
        Self {
            interfaces: vec![InterfaceInfo {
                iface_type: InterfaceType::Station,
                name: "wlan0".to_string(),
            }],
            registry_reachable: true,
        }
    }

    /// Replaces the default interface list with nothing.
    pub fn without_interfaces(mut self) -> Self {
        self.interfaces.clear();
        self
    }

    pub fn with_interface(mut self, info: InterfaceInfo) -> Self {
        self.interfaces.push(info);
        self
    }

    /// Makes both registration calls return false.
    pub fn unreachable_registry(mut self) -> Self {
        self.registry_reachable = false;
        self
    }

    pub fn build(self) -> (Arc<FakeSupplicant>, FakeSupplicantController) {
        let state = Arc::new(Mutex::new(DaemonState {
            alive: true,
            registry_reachable: self.registry_reachable,
            interfaces: self.interfaces,
            networks: BTreeMap::new(),
            next_network_id: 0,
            selected: None,
            calls: Vec::new(),
            rejections: HashMap::new(),
            faulted: HashSet::new(),
            death_listeners: Vec::new(),
            availability_listeners: Vec::new(),
        }));
        let registry = Arc::new(FakeSupplicant {
            state: Arc::clone(&state),
        });
        (registry, FakeSupplicantController { state })
    }
}

impl Default for FakeSupplicantBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The fake registry/daemon. Hand it to [`crate::StaIfaceClient::new`] as
/// the service registry.
pub struct FakeSupplicant {
    state: SharedState,
}

#[async_trait]
impl ServiceRegistry for FakeSupplicant {
    async fn lookup_root_interface(
        &self,
        name: &str,
    ) -> Result<Option<Arc<dyn RootInterface>>, TransportFault> {
        let mut s = self.state.lock();
        s.calls.push(format!("lookupRootInterface({name})"));
        if s.faulted.remove("lookupRootInterface") {
            return Err(TransportFault::new("registry lookup failed"));
        }
        if !s.alive {
            return Ok(None);
        }
        Ok(Some(Arc::new(FakeRoot {
            state: Arc::clone(&self.state),
        }) as Arc<dyn RootInterface>))
    }

    async fn register_death_notification(
        &self,
        events: mpsc::UnboundedSender<RegistryEvent>,
    ) -> bool {
        let mut s = self.state.lock();
        s.calls.push("registerDeathNotification".to_string());
        if !s.registry_reachable {
            return false;
        }
        s.death_listeners.push(events);
        true
    }

    async fn register_availability_notification(
        &self,
        name: &str,
        events: mpsc::UnboundedSender<RegistryEvent>,
    ) -> bool {
        let mut s = self.state.lock();
        s.calls.push(format!("registerAvailabilityNotification({name})"));
        if !s.registry_reachable {
            return false;
        }
        s.availability_listeners.push((name.to_string(), events));
        true
    }
}

struct FakeRoot {
    state: SharedState,
}

#[async_trait]
impl RootInterface for FakeRoot {
    async fn list_interfaces(&self) -> CallResult<Vec<InterfaceInfo>> {
        let mut s = self.state.lock();
        if let Some(out) = s.begin("listInterfaces".to_string(), "listInterfaces") {
            return out;
        }
        Ok(CallReply::success(s.interfaces.clone()))
    }

    async fn get_interface(&self, info: &InterfaceInfo) -> CallResult<Arc<dyn StationInterface>> {
        let mut s = self.state.lock();
        if let Some(out) = s.begin(format!("getInterface({})", info.name), "getInterface") {
            return out;
        }
        if !s.interfaces.contains(info) {
            return Ok(CallReply::failure(
                StatusCode::FailureIfaceUnknown,
                format!("no interface {}", info.name),
            ));
        }
        Ok(CallReply::success(Arc::new(FakeStation {
            state: Arc::clone(&self.state),
        }) as Arc<dyn StationInterface>))
    }
}

struct FakeStation {
    state: SharedState,
}

#[async_trait]
impl StationInterface for FakeStation {
    async fn add_network(&self) -> CallResult<Arc<dyn NetworkInterface>> {
        let mut s = self.state.lock();
        if let Some(out) = s.begin("addNetwork".to_string(), "addNetwork") {
            return out;
        }
        let id = s.next_network_id;
        s.next_network_id += 1;
        s.networks.insert(id, FakeNetworkEntry::default());
        Ok(CallReply::success(Arc::new(FakeNetwork {
            id,
            state: Arc::clone(&self.state),
        }) as Arc<dyn NetworkInterface>))
    }

    async fn remove_network(&self, id: NetworkId) -> CallResult<()> {
        let mut s = self.state.lock();
        if let Some(out) = s.begin(format!("removeNetwork({id})"), "removeNetwork") {
            return out;
        }
        if s.networks.remove(&id).is_none() {
            return Ok(CallReply::failure(
                StatusCode::FailureNetworkUnknown,
                format!("no network {id}"),
            ));
        }
        if s.selected == Some(id) {
            s.selected = None;
        }
        Ok(CallReply::success(()))
    }

    async fn get_network(&self, id: NetworkId) -> CallResult<Arc<dyn NetworkInterface>> {
        let mut s = self.state.lock();
        if let Some(out) = s.begin(format!("getNetwork({id})"), "getNetwork") {
            return out;
        }
        if !s.networks.contains_key(&id) {
            return Ok(CallReply::failure(
                StatusCode::FailureNetworkUnknown,
                format!("no network {id}"),
            ));
        }
        Ok(CallReply::success(Arc::new(FakeNetwork {
            id,
            state: Arc::clone(&self.state),
        }) as Arc<dyn NetworkInterface>))
    }

    async fn list_networks(&self) -> CallResult<Vec<NetworkId>> {
        let mut s = self.state.lock();
        if let Some(out) = s.begin("listNetworks".to_string(), "listNetworks") {
            return out;
        }
        Ok(CallReply::success(s.networks.keys().copied().collect()))
    }

    async fn disconnect(&self) -> CallResult<()> {
        unit_call(&self.state, "disconnect".to_string(), "disconnect")
    }

    async fn reconnect(&self) -> CallResult<()> {
        unit_call(&self.state, "reconnect".to_string(), "reconnect")
    }

    async fn reassociate(&self) -> CallResult<()> {
        unit_call(&self.state, "reassociate".to_string(), "reassociate")
    }

    async fn set_power_save(&self, enable: bool) -> CallResult<()> {
        unit_call(&self.state, format!("setPowerSave({enable})"), "setPowerSave")
    }

    async fn set_suspend_mode(&self, enable: bool) -> CallResult<()> {
        unit_call(&self.state, format!("setSuspendMode({enable})"), "setSuspendMode")
    }

    async fn set_country_code(&self, code: &str) -> CallResult<()> {
        unit_call(&self.state, format!("setCountryCode({code})"), "setCountryCode")
    }

    async fn get_mac_address(&self) -> CallResult<String> {
        let mut s = self.state.lock();
        if let Some(out) = s.begin("getMacAddress".to_string(), "getMacAddress") {
            return out;
        }
        Ok(CallReply::success("02:00:00:44:55:66".to_string()))
    }

    async fn start_rx_filter(&self) -> CallResult<()> {
        unit_call(&self.state, "startRxFilter".to_string(), "startRxFilter")
    }

    async fn stop_rx_filter(&self) -> CallResult<()> {
        unit_call(&self.state, "stopRxFilter".to_string(), "stopRxFilter")
    }

    async fn add_rx_filter(&self, filter: RxFilterType) -> CallResult<()> {
        unit_call(&self.state, format!("addRxFilter({filter:?})"), "addRxFilter")
    }

    async fn remove_rx_filter(&self, filter: RxFilterType) -> CallResult<()> {
        unit_call(&self.state, format!("removeRxFilter({filter:?})"), "removeRxFilter")
    }

    async fn set_bt_coexistence_mode(&self, mode: BtCoexMode) -> CallResult<()> {
        unit_call(
            &self.state,
            format!("setBtCoexistenceMode({mode:?})"),
            "setBtCoexistenceMode",
        )
    }

    async fn set_bt_coexistence_scan_mode(&self, enable: bool) -> CallResult<()> {
        unit_call(
            &self.state,
            format!("setBtCoexistenceScanMode({enable})"),
            "setBtCoexistenceScanMode",
        )
    }

    async fn initiate_tdls_discover(&self, peer: &str) -> CallResult<()> {
        unit_call(
            &self.state,
            format!("initiateTdlsDiscover({peer})"),
            "initiateTdlsDiscover",
        )
    }

    async fn initiate_tdls_setup(&self, peer: &str) -> CallResult<()> {
        unit_call(
            &self.state,
            format!("initiateTdlsSetup({peer})"),
            "initiateTdlsSetup",
        )
    }

    async fn initiate_tdls_teardown(&self, peer: &str) -> CallResult<()> {
        unit_call(
            &self.state,
            format!("initiateTdlsTeardown({peer})"),
            "initiateTdlsTeardown",
        )
    }

    async fn initiate_anqp_query(
        &self,
        bssid: &str,
        info_elements: &[u16],
        hs20_subtypes: &[u32],
    ) -> CallResult<()> {
        unit_call(
            &self.state,
            format!(
                "initiateAnqpQuery({bssid}, {} elements, {} subtypes)",
                info_elements.len(),
                hs20_subtypes.len()
            ),
            "initiateAnqpQuery",
        )
    }

    async fn initiate_hs20_icon_query(&self, bssid: &str, file_name: &str) -> CallResult<()> {
        unit_call(
            &self.state,
            format!("initiateHs20IconQuery({bssid}, {file_name})"),
            "initiateHs20IconQuery",
        )
    }
}

struct FakeNetwork {
    id: NetworkId,
    state: SharedState,
}

impl FakeNetwork {
    /// Runs `op` against this entry if it still exists; removed entries
    /// reject with an invalid-network status.
    fn with_entry<T>(
        &self,
        call: String,
        method: &str,
        op: impl FnOnce(&mut FakeNetworkEntry) -> T,
    ) -> CallResult<T> {
        let mut s = self.state.lock();
        if let Some(out) = s.begin(call, method) {
            return out;
        }
        match s.networks.get_mut(&self.id) {
            None => Ok(CallReply::failure(
                StatusCode::FailureNetworkInvalid,
                format!("network {} is gone", self.id),
            )),
            Some(entry) => Ok(CallReply::success(op(entry))),
        }
    }
}

#[async_trait]
impl NetworkInterface for FakeNetwork {
    fn id(&self) -> NetworkId {
        self.id
    }

    async fn set_parameter(&self, name: &str, value: &str) -> CallResult<()> {
        let (name, value) = (name.to_string(), value.to_string());
        self.with_entry(
            format!("setParameter({}, {name})", self.id),
            "setParameter",
            |entry| {
                entry.params.insert(name.clone(), value);
            },
        )
    }

    async fn get_parameter(&self, name: &str) -> CallResult<Option<String>> {
        self.with_entry(
            format!("getParameter({}, {name})", self.id),
            "getParameter",
            |entry| {
                if name == param::BSSID {
                    entry.bssid.clone()
                } else {
                    entry.params.get(name).cloned()
                }
            },
        )
    }

    async fn set_metadata(&self, blob: &str) -> CallResult<()> {
        let blob = blob.to_string();
        self.with_entry(format!("setMetadata({})", self.id), "setMetadata", |entry| {
            entry.metadata = Some(blob);
        })
    }

    async fn get_metadata(&self) -> CallResult<Option<String>> {
        self.with_entry(format!("getMetadata({})", self.id), "getMetadata", |entry| {
            entry.metadata.clone()
        })
    }

    async fn set_bssid(&self, bssid: Option<&str>) -> CallResult<()> {
        let bssid = bssid.map(str::to_string);
        self.with_entry(
            format!("setBssid({}, {:?})", self.id, bssid),
            "setBssid",
            |entry| {
                entry.bssid = bssid.clone();
            },
        )
    }

    async fn select(&self) -> CallResult<()> {
        let mut s = self.state.lock();
        if let Some(out) = s.begin(format!("select({})", self.id), "select") {
            return out;
        }
        if !s.networks.contains_key(&self.id) {
            return Ok(CallReply::failure(
                StatusCode::FailureNetworkInvalid,
                format!("network {} is gone", self.id),
            ));
        }
        s.selected = Some(self.id);
        Ok(CallReply::success(()))
    }
}

/// Drives the fake from the outside and inspects what the client did.
pub struct FakeSupplicantController {
    state: SharedState,
}

impl FakeSupplicantController {
    /// Emits a service-availability notification to every registered
    /// listener.
    pub fn announce_service(&self) {
        let s = self.state.lock();
        for (name, tx) in &s.availability_listeners {
            let _ = tx.send(RegistryEvent::ServiceAvailable {
                name: name.clone(),
                preexisting: false,
            });
        }
    }

    /// Emits a registry-death notification and voids every registration.
    pub fn kill_registry(&self) {
        let mut s = self.state.lock();
        for tx in &s.death_listeners {
            let _ = tx.send(RegistryEvent::RegistryDied);
        }
        s.death_listeners.clear();
        s.availability_listeners.clear();
    }

    /// Every subsequent remote call faults until the daemon is revived.
    pub fn kill_daemon(&self) {
        self.state.lock().alive = false;
    }

    pub fn revive_daemon(&self) {
        self.state.lock().alive = true;
    }

    /// Scripts a one-shot rejection for the next invocation of `method`.
    pub fn reject_next(&self, method: &str, status: StatusCode) {
        self.state.lock().rejections.insert(method.to_string(), status);
    }

    /// Scripts a one-shot delivery fault for the next invocation of
    /// `method`.
    pub fn fault_next(&self, method: &str) {
        self.state.lock().faulted.insert(method.to_string());
    }

    /// Creates a network entry as if a previous session had saved
    /// `record`, returning its daemon-side id.
    pub fn seed_network(&self, record: &NetworkConfigRecord) -> NetworkId {
        let mut s = self.state.lock();
        let id = s.next_network_id;
        s.next_network_id += 1;

        let mut entry = FakeNetworkEntry::default();
        entry
            .params
            .insert(param::SSID.to_string(), record.ssid.clone());
        entry
            .params
            .insert(param::SECURITY.to_string(), record.security.clone());
        for (name, value) in &record.fields {
            entry.params.insert(name.clone(), value.clone());
        }
        entry.bssid = record.bssid.clone();
        let mut extras = record.extras.clone();
        extras.insert(EXTRAS_KEY_CONFIG_KEY.to_string(), record.config_key());
        entry.metadata = Some(encode_extras(&extras));

        s.networks.insert(id, entry);
        id
    }

    /// Strips the metadata blob from a seeded entry, as left behind by a
    /// writer that predates metadata.
    pub fn clear_network_metadata(&self, id: NetworkId) {
        if let Some(entry) = self.state.lock().networks.get_mut(&id) {
            entry.metadata = None;
        }
    }

    /// Drains the recorded call log.
    pub fn take_calls(&self) -> Vec<String> {
        std::mem::take(&mut self.state.lock().calls)
    }

    pub fn network_ids(&self) -> Vec<NetworkId> {
        self.state.lock().networks.keys().copied().collect()
    }

    pub fn network_param(&self, id: NetworkId, name: &str) -> Option<String> {
        self.state
            .lock()
            .networks
            .get(&id)
            .and_then(|entry| entry.params.get(name).cloned())
    }

    pub fn selected_network(&self) -> Option<NetworkId> {
        self.state.lock().selected
    }
}
