//! Settings persistence contract

use crate::error::ConfigResult;
use crate::models::TorSettings;

/// Persistence for the Tor settings
///
/// The orchestrator only needs to read the saved settings once and write
/// accepted ones back.
pub trait SettingsStore: Send + Sync {
    /// Loads the saved settings, or defaults if none were saved
    ///
    /// # Errors
    /// Returns `ConfigError` if stored settings exist but can't be read
    fn load(&self) -> ConfigResult<TorSettings>;

    /// Persists settings
    ///
    /// # Errors
    /// Returns `ConfigError` if the settings can't be written
    fn save(&self, settings: &TorSettings) -> ConfigResult<()>;
}
