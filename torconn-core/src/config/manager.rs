//! Reading and writing `config.toml`
//!
//! The file holds an `[tor]` table with the connection settings and a
//! `[connection]` table with orchestrator knobs. A missing file, or a
//! missing table, reads as the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};
use crate::models::TorSettings;

use super::settings::AppSettings;
use super::store::SettingsStore;

const CONFIG_FILE: &str = "config.toml";

/// Owns the settings directory, `dirs::config_dir()/torconn` unless overridden
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Uses the platform config directory
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` when the platform has no config directory.
    pub fn new() -> ConfigResult<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound(PathBuf::from("~/.config")))?;
        Ok(Self::with_config_dir(base.join("torconn")))
    }

    /// Uses `config_dir` instead of the platform default
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Directory holding `config.toml`
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Full path of `config.toml`
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Creates the settings directory if needed
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Write` if the directory can't be created.
    pub fn ensure_config_dir(&self) -> ConfigResult<()> {
        if self.config_dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.config_dir).map_err(|e| {
            ConfigError::Write(format!(
                "can't create {}: {e}",
                self.config_dir.display()
            ))
        })
    }

    /// Reads the whole settings file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the file can't be read and
    /// `ConfigError::Deserialize` if it isn't valid settings TOML.
    pub fn load_settings(&self) -> ConfigResult<AppSettings> {
        let path = self.settings_path();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(AppSettings::default());
            }
            Err(e) => {
                return Err(ConfigError::Parse(format!("can't read {}: {e}", path.display())));
            }
        };
        toml::from_str(&text)
            .map_err(|e| ConfigError::Deserialize(format!("{}: {e}", path.display())))
    }

    /// Writes the whole settings file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Serialize` or `ConfigError::Write` on failure.
    pub fn save_settings(&self, settings: &AppSettings) -> ConfigResult<()> {
        self.ensure_config_dir()?;
        let text = toml::to_string_pretty(settings)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        let path = self.settings_path();
        fs::write(&path, text)
            .map_err(|e| ConfigError::Write(format!("can't write {}: {e}", path.display())))
    }

    /// The `[tor]` table
    ///
    /// # Errors
    ///
    /// Same as [`Self::load_settings`].
    pub fn load_tor_settings(&self) -> ConfigResult<TorSettings> {
        self.load_settings().map(|settings| settings.tor)
    }

    /// Rewrites the `[tor]` table and leaves `[connection]` alone
    ///
    /// # Errors
    ///
    /// Same as [`Self::load_settings`] and [`Self::save_settings`].
    pub fn save_tor_settings(&self, tor: &TorSettings) -> ConfigResult<()> {
        let settings = AppSettings {
            tor: tor.clone(),
            ..self.load_settings()?
        };
        self.save_settings(&settings)
    }
}

impl SettingsStore for ConfigManager {
    fn load(&self) -> ConfigResult<TorSettings> {
        self.load_tor_settings()
    }

    fn save(&self, settings: &TorSettings) -> ConfigResult<()> {
        tracing::info!(path = %self.settings_path().display(), "saving Tor settings");
        self.save_tor_settings(settings)
    }
}
