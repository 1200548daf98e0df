//! Data types for the supplicant control protocol.
//!
//! This crate contains the serde-serializable types shared between the
//! client core and any transport/registry implementation: status codes,
//! the typed reply of a single remote invocation, interface descriptors,
//! registry notifications, and network configuration records.
//!
//! Types in this crate are pure data: no behavior beyond
//! (de)serialization and key derivation. The session state machine and
//! call orchestration built on top of them live in `supplicant-client`.

pub mod call;
pub mod iface;
pub mod network;
pub mod status;

pub use call::*;
pub use iface::*;
pub use network::*;
pub use status::*;
