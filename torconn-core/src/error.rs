//! Error types for `TorConn`
//!
//! This module defines the error types used throughout the `TorConn` core,
//! covering settings validation, Tor connection attempts, and settings
//! file persistence.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while building, testing, or saving Tor settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Moat was selected but no bridges were requested yet
    #[error("You need to request a bridge from torproject.org before saving")]
    MoatBridgesEmpty,

    /// Custom bridges were selected but no line matched a bridge grammar
    #[error("None of the bridges you added seem to work. Double-check them or add others")]
    CustomBridgesInvalid,

    /// The connection attempt failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The user cancelled the connection attempt
    #[error("Connection cancelled")]
    ConnectionCancelled,

    /// The accepted settings could not be persisted
    #[error("Failed to save settings: {0}")]
    Save(#[from] ConfigError),
}

impl SettingsError {
    /// Returns the form field a validation error refers to
    ///
    /// Connection and persistence errors are not tied to a field.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::MoatBridgesEmpty => Some("moat_bridges"),
            Self::CustomBridgesInvalid => Some("custom_bridges"),
            Self::ConnectionFailed(_) | Self::ConnectionCancelled | Self::Save(_) => None,
        }
    }

    /// Returns true if the error came from form validation
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        self.field().is_some()
    }
}

impl From<ConnectError> for SettingsError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Cancelled => Self::ConnectionCancelled,
            other => Self::ConnectionFailed(other.to_string()),
        }
    }
}

/// Errors raised by a Tor session while connecting
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Could not reach the Tor control interface
    #[error("Can't connect to the Tor controller: {0}")]
    Unreachable(String),

    /// The controller rejected our authentication
    #[error("Authentication with the Tor controller failed: {0}")]
    AuthFailed(String),

    /// The controller replied with something we don't understand
    #[error("Unexpected reply from the Tor controller: {0}")]
    Protocol(String),

    /// The requested connection mode is not supported by this session
    #[error("Unsupported connection mode: {0}")]
    Unsupported(String),

    /// The attempt did not finish in time
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// The attempt was abandoned
    #[error("Connection cancelled")]
    Cancelled,

    /// I/O errors on the control connection
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to settings file operations
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the settings file
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Configuration directory could not be determined
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to write the settings file
    #[error("Failed to write configuration: {0}")]
    Write(String),

    /// Failed to serialize settings
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    /// Failed to deserialize settings
    #[error("Failed to deserialize configuration: {0}")]
    Deserialize(String),
}

/// Result type alias for settings operations
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

/// Result type alias for connection attempts
pub type ConnectResult<T> = std::result::Result<T, ConnectError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
