//! Custom bridge line validation
//!
//! Users paste bridge lines obtained from bridges.torproject.org or a friend.
//! Each line is checked against the bridge-line shapes Tor accepts; lines
//! that look wrong are dropped while the rest are kept in their original
//! order.

use std::sync::LazyLock;

use regex::Regex;

/// `[obfs4] a.b.c.d:port FINGERPRINT params...`
static IPV4_BRIDGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(obfs4\s+)?(([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5])\.){3}([0-9]|[1-9][0-9]|1[0-9]{2}|2[0-4][0-9]|25[0-5]):([0-9]+)(\s+)([A-Z0-9]+)(.+)$",
    )
    .expect("IPv4 bridge pattern is valid")
});

/// `[obfs4] [ipv6]:port FINGERPRINT params...`
static IPV6_BRIDGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(obfs4\s+)?\[(([0-9a-fA-F]{1,4}:){7,7}[0-9a-fA-F]{1,4}|([0-9a-fA-F]{1,4}:){1,7}:|([0-9a-fA-F]{1,4}:){1,6}:[0-9a-fA-F]{1,4}|([0-9a-fA-F]{1,4}:){1,5}(:[0-9a-fA-F]{1,4}){1,2}|([0-9a-fA-F]{1,4}:){1,4}(:[0-9a-fA-F]{1,4}){1,3}|([0-9a-fA-F]{1,4}:){1,3}(:[0-9a-fA-F]{1,4}){1,4}|([0-9a-fA-F]{1,4}:){1,2}(:[0-9a-fA-F]{1,4}){1,5}|[0-9a-fA-F]{1,4}:((:[0-9a-fA-F]{1,4}){1,6})|:((:[0-9a-fA-F]{1,4}){1,7}|:)|fe80:(:[0-9a-fA-F]{0,4}){0,4}%[0-9a-zA-Z]{1,}|::(ffff(:0{1,4}){0,1}:){0,1}((25[0-5]|(2[0-4]|1{0,1}[0-9]){0,1}[0-9])\.){3,3}(25[0-5]|(2[0-4]|1{0,1}[0-9]){0,1}[0-9])|([0-9a-fA-F]{1,4}:){1,4}:((25[0-5]|(2[0-4]|1{0,1}[0-9]){0,1}[0-9])\.){3,3}(25[0-5]|(2[0-4]|1{0,1}[0-9]){0,1}[0-9]))\]:[0-9]+\s+[A-Z0-9]+(.+)$",
    )
    .expect("IPv6 bridge pattern is valid")
});

/// `meek_lite a.b.c.d:port FINGERPRINT url=... front=...`
static MEEK_LITE_BRIDGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(meek_lite)(\s)+([0-9]+\.[0-9]+\.[0-9]+\.[0-9]+:[0-9]+)(\s)+([0-9A-Z]+)(\s)+url=(.+)(\s)+front=(.+)",
    )
    .expect("meek_lite bridge pattern is valid")
});

/// `snowflake a.b.c.d:port FINGERPRINT ...`
static SNOWFLAKE_BRIDGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(snowflake)(\s)+([0-9]+\.[0-9]+\.[0-9]+\.[0-9]+:[0-9]+)(\s)+([0-9A-Z]+)")
        .expect("snowflake bridge pattern is valid")
});

/// The bridge-line shape a line was recognised as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeGrammar {
    /// Plain or obfs4 bridge on an IPv4 address
    Ipv4,
    /// Plain or obfs4 bridge on a bracketed IPv6 address
    Ipv6,
    /// meek_lite bridge with url and front parameters
    MeekLite,
    /// Snowflake bridge
    Snowflake,
}

impl BridgeGrammar {
    /// Returns a short name for display
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
            Self::MeekLite => "meek_lite",
            Self::Snowflake => "snowflake",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Self::Ipv4 => &IPV4_BRIDGE,
            Self::Ipv6 => &IPV6_BRIDGE,
            Self::MeekLite => &MEEK_LITE_BRIDGE,
            Self::Snowflake => &SNOWFLAKE_BRIDGE,
        }
    }
}

impl std::fmt::Display for BridgeGrammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const GRAMMARS: [BridgeGrammar; 4] = [
    BridgeGrammar::Ipv4,
    BridgeGrammar::Ipv6,
    BridgeGrammar::MeekLite,
    BridgeGrammar::Snowflake,
];

/// Returns the first grammar the line matches, if any.
///
/// # Examples
/// ```
/// use torconn_core::bridge::{classify_bridge_line, BridgeGrammar};
///
/// let line = "snowflake 192.0.2.3:80 2B280B23E1107BB62ABFC40DDCC8824814F80A72";
/// assert_eq!(classify_bridge_line(line), Some(BridgeGrammar::Snowflake));
/// assert_eq!(classify_bridge_line("notabridge"), None);
/// ```
#[must_use]
pub fn classify_bridge_line(line: &str) -> Option<BridgeGrammar> {
    GRAMMARS.into_iter().find(|g| g.pattern().is_match(line))
}

/// Outcome of checking a block of bridge lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeValidation {
    accepted: Vec<String>,
    rejected: Vec<String>,
}

impl BridgeValidation {
    /// Returns true if at least one line was accepted
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.accepted.is_empty()
    }

    /// Accepted lines, in input order
    #[must_use]
    pub fn accepted(&self) -> &[String] {
        &self.accepted
    }

    /// Non-blank lines that matched no grammar, in input order
    #[must_use]
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    /// Joins the accepted lines, each terminated by a newline.
    ///
    /// Returns `None` when nothing was accepted.
    #[must_use]
    pub fn to_bridge_text(&self) -> Option<String> {
        if !self.is_valid() {
            return None;
        }
        let mut text = self.accepted.join("\n");
        text.push('\n');
        Some(text)
    }
}

/// Checks every non-blank line of `text` against the bridge grammars.
///
/// A malformed line doesn't invalidate the others; the block as a whole
/// is only invalid when no line is accepted.
#[must_use]
pub fn validate_bridges(text: &str) -> BridgeValidation {
    let mut result = BridgeValidation::default();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match classify_bridge_line(line) {
            Some(grammar) => {
                tracing::trace!(grammar = %grammar, "accepted bridge line");
                result.accepted.push(line.to_string());
            }
            None => result.rejected.push(line.to_string()),
        }
    }
    result
}
