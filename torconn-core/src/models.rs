//! Core data models for `TorConn`
//!
//! This module defines the persisted Tor settings record, the bridge
//! selection types, and the status reported by a connected controller.

mod bridge;
mod settings;
mod status;

pub use bridge::{BridgeMode, BuiltinBridge};
pub use settings::{AuthMode, ConnectionMode, TorSettings};
pub use status::TorStatus;
