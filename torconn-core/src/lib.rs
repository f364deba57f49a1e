//! `TorConn` Core Library
//!
//! This crate provides the core of the Tor connection settings: bridge line
//! validation, building settings from form input, deciding when a saved
//! change needs a reconnect, and orchestrating test and save actions
//! against a Tor controller.

pub mod bridge;
pub mod builder;
pub mod config;
pub mod control;
pub mod diff;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod session;
pub mod view;

pub use bridge::{classify_bridge_line, validate_bridges, BridgeGrammar, BridgeValidation};
pub use builder::{needs_meek_warning, BridgeSource, Capabilities, SettingsForm};
pub use config::{AppSettings, ConfigManager, ConnectionSettings, SettingsStore};
pub use control::{ControlPortFactory, ControlPortSession};
pub use diff::{decide, ReconnectDecision, ReconnectPolicy, SettingField};
pub use error::{
    ConfigError, ConfigResult, ConnectError, ConnectResult, SettingsError, SettingsResult,
};
pub use models::{AuthMode, BridgeMode, BuiltinBridge, ConnectionMode, TorSettings, TorStatus};
pub use orchestrator::{Action, OrchestratorOptions, Outcome, SettingsOrchestrator};
pub use progress::{
    CallbackObserver, CancelHandle, NoOpObserver, OrchestratorState, StateObserver,
};
pub use session::{SessionFactory, TorSession};
pub use view::SettingsView;
