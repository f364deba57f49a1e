//! Visibility of the Tor settings widgets
//!
//! The settings screen hides and shows groups as radios and checkboxes
//! change. `SettingsView::derive` computes the whole picture from the
//! current form so a front end only has to apply it.

use crate::builder::{BridgeSource, Capabilities, SettingsForm};
use crate::error::SettingsError;
use crate::models::{BuiltinBridge, ConnectionMode};
use crate::progress::OrchestratorState;

/// What the settings screen should show
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SettingsView {
    /// The "bundled Tor" radio can be selected
    pub bundled_enabled: bool,
    /// Control port / socket file settings group
    pub tor_settings_group_visible: bool,
    /// Control port address and port entries
    pub control_port_extras: bool,
    /// Socket file path entry
    pub socket_file_extras: bool,
    /// SOCKS address and port entries
    pub socks_visible: bool,
    /// Password entry, shown when authenticating with a password
    pub password_extras: bool,
    /// The "use a bridge" group
    pub bridges_group_visible: bool,
    /// Bridge source radios, shown once bridges are enabled
    pub bridge_settings_visible: bool,
    /// Built-in transport drop-down
    pub builtin_dropdown: bool,
    /// Moat request button and text box
    pub moat_options: bool,
    /// Custom bridges text box
    pub custom_options: bool,
    /// Transports offered in the built-in drop-down
    pub builtin_choices: Vec<BuiltinBridge>,
    /// Test and Save buttons are clickable
    pub actions_enabled: bool,
    /// Field to highlight after a validation error
    pub error_field: Option<&'static str>,
    /// Message for the status line
    pub error_message: Option<String>,
}

impl SettingsView {
    /// Derives the view for `form` in `state`, highlighting `error` if given
    #[must_use]
    pub fn derive(
        form: &SettingsForm,
        capabilities: &Capabilities,
        state: OrchestratorState,
        error: Option<&SettingsError>,
    ) -> Self {
        let tor_settings_group_visible = matches!(
            form.connection_mode,
            ConnectionMode::ControlPort | ConnectionMode::SocketFile
        );
        let bridges_group_visible = form.connection_mode == ConnectionMode::Bundled;
        let bridge_settings_visible = bridges_group_visible && form.use_bridges;

        Self {
            bundled_enabled: capabilities.bundled_available,
            tor_settings_group_visible,
            control_port_extras: form.connection_mode == ConnectionMode::ControlPort,
            socket_file_extras: form.connection_mode == ConnectionMode::SocketFile,
            socks_visible: tor_settings_group_visible,
            password_extras: tor_settings_group_visible && !form.no_auth,
            bridges_group_visible,
            bridge_settings_visible,
            builtin_dropdown: bridge_settings_visible
                && form.bridge_source == BridgeSource::Builtin,
            moat_options: bridge_settings_visible && form.bridge_source == BridgeSource::Moat,
            custom_options: bridge_settings_visible && form.bridge_source == BridgeSource::Custom,
            builtin_choices: capabilities.builtin_bridges(),
            actions_enabled: !state.is_busy(),
            error_field: error.and_then(SettingsError::field),
            error_message: error.map(ToString::to_string),
        }
    }
}
