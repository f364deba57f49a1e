//! Configuration management for `TorConn`
//!
//! This module provides the `ConfigManager` for loading and saving
//! the settings file in TOML format.

mod manager;
pub mod settings;
mod store;

pub use manager::ConfigManager;
pub use settings::{AppSettings, ConnectionSettings};
pub use store::SettingsStore;
