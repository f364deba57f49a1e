//! Building `TorSettings` from settings form input
//!
//! A `SettingsForm` holds the raw selections and text of the Tor settings
//! screen. Radio groups are plain enums, so the form can never have two
//! connection modes or two bridge sources checked at once. Turning a form
//! into `TorSettings` is a pure function: it either returns a complete
//! record or the validation error of the first bad field.

use secrecy::SecretString;

use crate::bridge::validate_bridges;
use crate::error::{SettingsError, SettingsResult};
use crate::models::{AuthMode, BridgeMode, BuiltinBridge, ConnectionMode, TorSettings};

/// Which bridge radio button is selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BridgeSource {
    /// A transport shipped with the bundled Tor
    #[default]
    Builtin,
    /// Bridges requested from torproject.org
    Moat,
    /// Bridges pasted by the user
    Custom,
}

/// What the running installation can offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The bundled Tor binary can be launched
    pub bundled_available: bool,
    /// obfs4proxy is installed (provides obfs4 and meek-azure)
    pub obfs4_available: bool,
    /// The snowflake client is installed
    pub snowflake_available: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            bundled_available: true,
            obfs4_available: true,
            snowflake_available: true,
        }
    }
}

impl Capabilities {
    /// Built-in transports that can be offered in the drop-down
    #[must_use]
    pub fn builtin_bridges(&self) -> Vec<BuiltinBridge> {
        BuiltinBridge::ALL
            .into_iter()
            .filter(|b| self.supports(*b))
            .collect()
    }

    /// Returns true if the transport's binary is available
    #[must_use]
    pub const fn supports(&self, bridge: BuiltinBridge) -> bool {
        match bridge {
            BuiltinBridge::Obfs4 | BuiltinBridge::MeekAzure => self.obfs4_available,
            BuiltinBridge::Snowflake => self.snowflake_available,
        }
    }
}

/// Raw contents of the Tor settings form
#[derive(Debug, Clone)]
pub struct SettingsForm {
    /// Selected connection mode radio
    pub connection_mode: ConnectionMode,
    /// Control port address entry
    pub control_port_address: String,
    /// Control port number entry
    pub control_port_port: String,
    /// Socket file path entry
    pub socket_file_path: String,
    /// SOCKS address entry
    pub socks_address: String,
    /// SOCKS port entry
    pub socks_port: String,
    /// "No authentication" checkbox
    pub no_auth: bool,
    /// Password entry
    pub auth_password: SecretString,
    /// "Use a bridge" checkbox
    pub use_bridges: bool,
    /// Selected bridge radio
    pub bridge_source: BridgeSource,
    /// Built-in bridge drop-down selection
    pub builtin_bridge: BuiltinBridge,
    /// Moat text box (read-only, filled by the Moat dialog)
    pub moat_bridges: String,
    /// Custom bridges text box
    pub custom_bridges: String,
}

impl Default for SettingsForm {
    fn default() -> Self {
        Self::from_settings(&TorSettings::default(), &Capabilities::default())
    }
}

impl SettingsForm {
    /// Fills the form from previously saved settings.
    ///
    /// When the bundled Tor can't be used the form falls back to
    /// `Automatic`. Text boxes keep the lines of their matching bridge mode
    /// and stay empty otherwise.
    #[must_use]
    pub fn from_settings(settings: &TorSettings, capabilities: &Capabilities) -> Self {
        let connection_mode = match settings.connection_mode {
            ConnectionMode::Bundled if !capabilities.bundled_available => {
                tracing::debug!("bundled Tor unavailable, falling back to automatic");
                ConnectionMode::Automatic
            }
            mode => mode,
        };

        let default_builtin = capabilities
            .builtin_bridges()
            .first()
            .copied()
            .unwrap_or(BuiltinBridge::Obfs4);

        let (bridge_source, builtin_bridge) = match &settings.bridge_mode {
            BridgeMode::None => (BridgeSource::default(), default_builtin),
            BridgeMode::Builtin(kind) => (BridgeSource::Builtin, *kind),
            BridgeMode::Moat(_) => (BridgeSource::Moat, default_builtin),
            BridgeMode::Custom(_) => (BridgeSource::Custom, default_builtin),
        };

        Self {
            connection_mode,
            control_port_address: settings.control_port_address.clone(),
            control_port_port: settings.control_port_port.clone(),
            socket_file_path: settings.socket_file_path.clone(),
            socks_address: settings.socks_address.clone(),
            socks_port: settings.socks_port.clone(),
            no_auth: settings.auth_mode == AuthMode::NoAuth,
            auth_password: settings.auth_password.clone(),
            use_bridges: settings.bridge_mode.is_enabled(),
            bridge_source,
            builtin_bridge,
            moat_bridges: settings.bridge_mode.moat_bridges().to_string(),
            custom_bridges: settings.bridge_mode.custom_bridges().to_string(),
        }
    }

    /// Builds settings from the form.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::MoatBridgesEmpty` if Moat is selected with an
    /// empty text box, or `SettingsError::CustomBridgesInvalid` if custom
    /// bridges are selected and no line is a valid bridge.
    pub fn build(&self) -> SettingsResult<TorSettings> {
        Ok(TorSettings {
            connection_mode: self.connection_mode,
            control_port_address: self.control_port_address.clone(),
            control_port_port: self.control_port_port.clone(),
            socket_file_path: self.socket_file_path.clone(),
            socks_address: self.socks_address.clone(),
            socks_port: self.socks_port.clone(),
            auth_mode: if self.no_auth {
                AuthMode::NoAuth
            } else {
                AuthMode::Password
            },
            auth_password: self.auth_password.clone(),
            bridge_mode: self.bridge_mode()?,
        })
    }

    fn bridge_mode(&self) -> SettingsResult<BridgeMode> {
        if !self.use_bridges {
            return Ok(BridgeMode::None);
        }
        match self.bridge_source {
            BridgeSource::Builtin => Ok(BridgeMode::Builtin(self.builtin_bridge)),
            BridgeSource::Moat => {
                if self.moat_bridges.trim().is_empty() {
                    return Err(SettingsError::MoatBridgesEmpty);
                }
                Ok(BridgeMode::Moat(self.moat_bridges.clone()))
            }
            BridgeSource::Custom => {
                let validation = validate_bridges(&self.custom_bridges);
                if !validation.rejected().is_empty() {
                    tracing::debug!(
                        rejected = validation.rejected().len(),
                        "dropping malformed custom bridge lines"
                    );
                }
                validation
                    .to_bridge_text()
                    .map(BridgeMode::Custom)
                    .ok_or(SettingsError::CustomBridgesInvalid)
            }
        }
    }
}

/// Returns true if picking `selection` deserves the meek-azure cost warning.
///
/// meek-azure is expensive for the Tor Project to run, so users switching
/// to it are asked to prefer another transport when they can.
#[must_use]
pub fn needs_meek_warning(previous: &TorSettings, selection: BuiltinBridge) -> bool {
    selection == BuiltinBridge::MeekAzure
        && previous.bridge_mode.builtin() != Some(BuiltinBridge::MeekAzure)
}
