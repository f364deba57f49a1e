//! Tor connection settings model.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::BridgeMode;

/// How `TorConn` reaches a Tor instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Launch the Tor binary shipped with the application
    #[default]
    Bundled,
    /// Find a system Tor automatically
    Automatic,
    /// Connect to a Tor control port over TCP
    ControlPort,
    /// Connect to a Tor control socket file
    SocketFile,
}

impl ConnectionMode {
    /// Returns the identifier used on the command line and in settings files
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bundled => "bundled",
            Self::Automatic => "automatic",
            Self::ControlPort => "control_port",
            Self::SocketFile => "socket_file",
        }
    }
}

impl std::fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bundled => write!(f, "Bundled Tor"),
            Self::Automatic => write!(f, "Automatic"),
            Self::ControlPort => write!(f, "Control port"),
            Self::SocketFile => write!(f, "Socket file"),
        }
    }
}

/// How to authenticate to the Tor controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// No authentication, or cookie authentication
    #[default]
    NoAuth,
    /// Controller password
    Password,
}

/// Persisted Tor connection settings
///
/// Ports are kept as the raw strings the user typed. A value of this type
/// is always complete: the builder either produces one or fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorSettings {
    /// Selected connection mode
    #[serde(default)]
    pub connection_mode: ConnectionMode,
    /// Control port address
    #[serde(default = "default_address")]
    pub control_port_address: String,
    /// Control port number
    #[serde(default = "default_control_port")]
    pub control_port_port: String,
    /// Path to the Tor control socket
    #[serde(default = "default_socket_file_path")]
    pub socket_file_path: String,
    /// SOCKS proxy address
    #[serde(default = "default_address")]
    pub socks_address: String,
    /// SOCKS proxy port
    #[serde(default = "default_socks_port")]
    pub socks_port: String,
    /// Controller authentication mode
    #[serde(default)]
    pub auth_mode: AuthMode,
    /// Controller password, kept even when `auth_mode` is `NoAuth`
    #[serde(
        default = "empty_secret",
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub auth_password: SecretString,
    /// Bridge configuration
    #[serde(default)]
    pub bridge_mode: BridgeMode,
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_control_port() -> String {
    "9051".to_string()
}

fn default_socks_port() -> String {
    "9050".to_string()
}

fn default_socket_file_path() -> String {
    "/var/run/tor/control".to_string()
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

fn serialize_secret<S>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl Default for TorSettings {
    fn default() -> Self {
        Self {
            connection_mode: ConnectionMode::default(),
            control_port_address: default_address(),
            control_port_port: default_control_port(),
            socket_file_path: default_socket_file_path(),
            socks_address: default_address(),
            socks_port: default_socks_port(),
            auth_mode: AuthMode::default(),
            auth_password: empty_secret(),
            bridge_mode: BridgeMode::default(),
        }
    }
}

impl TorSettings {
    /// Returns the controller password in plain text
    #[must_use]
    pub fn password(&self) -> &str {
        self.auth_password.expose_secret()
    }

    /// Returns the password to send when authenticating, if any
    #[must_use]
    pub fn auth_password_for_connect(&self) -> Option<&str> {
        match self.auth_mode {
            AuthMode::NoAuth => None,
            AuthMode::Password => Some(self.password()),
        }
    }
}

impl PartialEq for TorSettings {
    fn eq(&self, other: &Self) -> bool {
        self.connection_mode == other.connection_mode
            && self.control_port_address == other.control_port_address
            && self.control_port_port == other.control_port_port
            && self.socket_file_path == other.socket_file_path
            && self.socks_address == other.socks_address
            && self.socks_port == other.socks_port
            && self.auth_mode == other.auth_mode
            && self.password() == other.password()
            && self.bridge_mode == other.bridge_mode
    }
}

impl Eq for TorSettings {}
