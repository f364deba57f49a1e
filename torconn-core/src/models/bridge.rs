//! Bridge selection types.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Built-in bridge transports shipped with the bundled Tor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinBridge {
    /// obfs4 pluggable transport
    Obfs4,
    /// meek_lite fronted through Azure
    MeekAzure,
    /// Snowflake WebRTC transport
    Snowflake,
}

impl BuiltinBridge {
    /// All built-in transports in the order they are offered
    pub const ALL: [Self; 3] = [Self::Obfs4, Self::MeekAzure, Self::Snowflake];

    /// Returns the name shown in the bridge drop-down
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Obfs4 => "obfs4",
            Self::MeekAzure => "meek-azure",
            Self::Snowflake => "snowflake",
        }
    }
}

impl std::fmt::Display for BuiltinBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuiltinBridge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown built-in bridge: {s}"))
    }
}

/// Which bridges, if any, Tor should use
///
/// Exactly one variant is active, so "obfs4 and snowflake at once" cannot
/// be represented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum BridgeMode {
    /// Bridges disabled
    #[default]
    None,
    /// One of the built-in transports
    Builtin(BuiltinBridge),
    /// Bridge lines issued by Moat, stored as received
    Moat(String),
    /// Validated custom bridge lines, newline-terminated
    Custom(String),
}

impl BridgeMode {
    /// Returns true if bridges are enabled
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns the built-in transport, if one is selected
    #[must_use]
    pub const fn builtin(&self) -> Option<BuiltinBridge> {
        match self {
            Self::Builtin(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Returns the Moat bridge lines, or an empty string
    #[must_use]
    pub fn moat_bridges(&self) -> &str {
        match self {
            Self::Moat(lines) => lines,
            _ => "",
        }
    }

    /// Returns the custom bridge lines, or an empty string
    #[must_use]
    pub fn custom_bridges(&self) -> &str {
        match self {
            Self::Custom(lines) => lines,
            _ => "",
        }
    }
}
