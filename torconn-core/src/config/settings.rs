//! Application settings model
//!
//! This module defines the application-wide settings stored in config.toml.

use serde::{Deserialize, Serialize};

use crate::diff::ReconnectPolicy;
use crate::models::TorSettings;

/// Application-wide settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// How the application talks to Tor
    #[serde(default)]
    pub connection: ConnectionSettings,
    /// Tor connection settings
    #[serde(default)]
    pub tor: TorSettings,
}

/// Behaviour of connection attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Run without Tor; saving settings never reconnects
    #[serde(default)]
    pub local_only: bool,
    /// Seconds to wait for a connection attempt
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Reconnect when only the Moat bridge lines changed
    #[serde(default)]
    pub reconnect_on_moat_change: bool,
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            local_only: false,
            timeout_secs: default_timeout_secs(),
            reconnect_on_moat_change: false,
        }
    }
}

impl ConnectionSettings {
    /// Returns the reconnect policy these settings ask for
    #[must_use]
    pub const fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            compare_moat_bridges: self.reconnect_on_moat_change,
        }
    }

    /// Returns the connection timeout
    #[must_use]
    pub const fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}
