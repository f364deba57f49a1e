//! Deciding whether a settings change needs a Tor reconnect

use crate::models::TorSettings;

/// What to do with the live Tor session after saving settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// The live session already matches the new settings
    NoActionNeeded,
    /// The live session must be torn down and reconnected
    MustReconnect,
}

/// A setting whose change affects the Tor connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingField {
    /// Connection mode
    ConnectionMode,
    /// Control port address
    ControlPortAddress,
    /// Control port number
    ControlPortPort,
    /// SOCKS address
    SocksAddress,
    /// SOCKS port
    SocksPort,
    /// Control socket path
    SocketFilePath,
    /// Authentication mode
    AuthMode,
    /// Controller password
    AuthPassword,
    /// Whether bridges are disabled
    NoBridges,
    /// Selected built-in transport
    BuiltinBridge,
    /// Custom bridge lines
    CustomBridges,
    /// Moat bridge lines
    MoatBridges,
}

impl SettingField {
    /// Returns the settings key name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionMode => "connection_mode",
            Self::ControlPortAddress => "control_port_address",
            Self::ControlPortPort => "control_port_port",
            Self::SocksAddress => "socks_address",
            Self::SocksPort => "socks_port",
            Self::SocketFilePath => "socket_file_path",
            Self::AuthMode => "auth_mode",
            Self::AuthPassword => "auth_password",
            Self::NoBridges => "no_bridges",
            Self::BuiltinBridge => "builtin_bridge",
            Self::CustomBridges => "custom_bridges",
            Self::MoatBridges => "moat_bridges",
        }
    }

    fn differs(self, a: &TorSettings, b: &TorSettings) -> bool {
        match self {
            Self::ConnectionMode => a.connection_mode != b.connection_mode,
            Self::ControlPortAddress => a.control_port_address != b.control_port_address,
            Self::ControlPortPort => a.control_port_port != b.control_port_port,
            Self::SocksAddress => a.socks_address != b.socks_address,
            Self::SocksPort => a.socks_port != b.socks_port,
            Self::SocketFilePath => a.socket_file_path != b.socket_file_path,
            Self::AuthMode => a.auth_mode != b.auth_mode,
            Self::AuthPassword => a.password() != b.password(),
            Self::NoBridges => a.bridge_mode.is_enabled() != b.bridge_mode.is_enabled(),
            Self::BuiltinBridge => a.bridge_mode.builtin() != b.bridge_mode.builtin(),
            Self::CustomBridges => a.bridge_mode.custom_bridges() != b.bridge_mode.custom_bridges(),
            Self::MoatBridges => a.bridge_mode.moat_bridges() != b.bridge_mode.moat_bridges(),
        }
    }
}

/// Fields compared before deciding to reconnect.
///
/// Moat bridge lines are left out; see `ReconnectPolicy::compare_moat_bridges`.
pub const RECONNECT_FIELDS: [SettingField; 11] = [
    SettingField::ConnectionMode,
    SettingField::ControlPortAddress,
    SettingField::ControlPortPort,
    SettingField::SocksAddress,
    SettingField::SocksPort,
    SettingField::SocketFilePath,
    SettingField::AuthMode,
    SettingField::AuthPassword,
    SettingField::NoBridges,
    SettingField::BuiltinBridge,
    SettingField::CustomBridges,
];

/// Reconnect rules applied when settings are saved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconnectPolicy {
    /// Also reconnect when only the Moat bridge lines changed
    pub compare_moat_bridges: bool,
}

impl ReconnectPolicy {
    /// Returns the fields that differ between `candidate` and `previous`
    #[must_use]
    pub fn changed_fields(
        &self,
        candidate: &TorSettings,
        previous: &TorSettings,
    ) -> Vec<SettingField> {
        let moat = self
            .compare_moat_bridges
            .then_some(SettingField::MoatBridges);
        RECONNECT_FIELDS
            .into_iter()
            .chain(moat)
            .filter(|field| field.differs(candidate, previous))
            .collect()
    }

    /// Decides whether saving `candidate` over `previous` needs a reconnect.
    ///
    /// Without an authenticated session there is nothing to keep, so the
    /// answer is always `MustReconnect`.
    #[must_use]
    pub fn decide(
        &self,
        candidate: &TorSettings,
        previous: &TorSettings,
        authenticated: bool,
    ) -> ReconnectDecision {
        if !authenticated {
            tracing::debug!("not connected to Tor, a connection attempt is needed");
            return ReconnectDecision::MustReconnect;
        }
        let changed = self.changed_fields(candidate, previous);
        if changed.is_empty() {
            ReconnectDecision::NoActionNeeded
        } else {
            tracing::debug!(
                fields = ?changed.iter().map(SettingField::as_str).collect::<Vec<_>>(),
                "Tor settings changed"
            );
            ReconnectDecision::MustReconnect
        }
    }
}

/// Applies the default `ReconnectPolicy`
#[must_use]
pub fn decide(
    candidate: &TorSettings,
    previous: &TorSettings,
    authenticated: bool,
) -> ReconnectDecision {
    ReconnectPolicy::default().decide(candidate, previous, authenticated)
}
