//! Information reported by a connected Tor controller.

use serde::{Deserialize, Serialize};

/// Version and feature support of the Tor instance we connected to
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TorStatus {
    /// Version string reported by `GETINFO version`
    pub tor_version: String,
    /// Whether ephemeral onion services are supported
    pub supports_ephemeral: bool,
    /// Whether stealth (client auth) onion services are supported
    pub supports_stealth: bool,
    /// Whether v3 onion services are supported
    pub supports_v3_onions: bool,
}

impl TorStatus {
    /// Derives feature support from a Tor version string such as
    /// `0.4.8.9 (git-abc)`.
    #[must_use]
    pub fn from_version(version: &str) -> Self {
        let parsed = parse_version(version);
        let at_least = |min: [u32; 4]| parsed.is_some_and(|v| v >= min);
        Self {
            tor_version: version.to_string(),
            supports_ephemeral: at_least([0, 2, 7, 1]),
            supports_stealth: at_least([0, 2, 9, 1]),
            supports_v3_onions: at_least([0, 3, 5, 7]),
        }
    }
}

/// Parses the leading `a.b.c.d` of a Tor version, ignoring status tags
fn parse_version(version: &str) -> Option<[u32; 4]> {
    let numeric = version.split_whitespace().next()?;
    let numeric = numeric.split('-').next()?;
    let mut parts = [0u32; 4];
    let mut count = 0;
    for (slot, piece) in parts.iter_mut().zip(numeric.split('.')) {
        *slot = piece.parse().ok()?;
        count += 1;
    }
    (count >= 3).then_some(parts)
}

impl std::fmt::Display for TorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Connected to the Tor controller.")?;
        writeln!(f, "Tor version: {}", self.tor_version)?;
        writeln!(f, "Supports ephemeral onion services: {}", self.supports_ephemeral)?;
        writeln!(f, "Supports authenticated onion services: {}", self.supports_stealth)?;
        write!(f, "Supports next-gen onion services: {}", self.supports_v3_onions)
    }
}
