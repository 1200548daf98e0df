//! Interface descriptors and registry notifications.

use serde::{Deserialize, Serialize};

/// Kind of daemon-side interface, as declared by the enumeration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceType {
    /// Per-device interface exposing network operations.
    Station,
    AccessPoint,
    P2p,
}

/// One entry of the root interface enumeration.
///
/// Opaque to callers: the record is only meaningful when handed back to
/// the root for resolution into a typed handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    #[serde(rename = "type")]
    pub iface_type: InterfaceType,
    pub name: String,
}

/// Notification delivered by the service registry.
///
/// These arrive on the event channel from a context outside the caller's
/// control; the client's dispatch loop serializes them against in-flight
/// operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// The watched service is now reachable through the registry.
    ServiceAvailable { name: String, preexisting: bool },
    /// The registry itself died; every registration is void.
    RegistryDied,
}
