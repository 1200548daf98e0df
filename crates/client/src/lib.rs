//! Client session and call orchestration for a supplicant-style daemon.
//!
//! The daemon that authenticates and manages wireless associations is only
//! reachable through an asynchronous service registry, can die and reappear
//! at any time, and every remote call can fail independently. This crate
//! presents synchronous-looking, idempotent operations on top of that:
//! acquire the daemon's interfaces, keep track of their liveness, and drive
//! the multi-step protocol for configuring and activating a network.
//!
//! # Architecture
//!
//! * [`remote`] defines the external-collaborator traits: the service
//!   registry and the daemon's root, station, and network interfaces. A
//!   transport implementation provides these; [`fake`] provides an
//!   in-memory one for tests.
//! * [`StaIfaceClient`] owns all session state behind a single lock and
//!   exposes the host-facing operations. Registry notifications are
//!   consumed by its [`run`](StaIfaceClient::run) loop, which the host
//!   spawns in a background task.
//! * [`NetworkHandle`] wraps one daemon-side network entry and pushes or
//!   pulls whole configuration records through it.

pub mod client;
pub mod error;
pub mod fake;
pub mod network;
pub mod remote;

mod catalog;
mod orchestrator;
mod rpc;
mod session;

pub use client::StaIfaceClient;
pub use error::{Error, Result};
pub use network::NetworkHandle;
pub use remote::{
    DEFAULT_SERVICE_NAME, NetworkInterface, RootInterface, ServiceRegistry, StationInterface,
};

pub use supplicant_protocol as protocol;
