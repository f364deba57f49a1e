//! Property-based tests for bridge line validation
//!
//! **Property: Valid lines survive, garbage is dropped, order is kept**

use proptest::prelude::*;
use torconn_core::bridge::{classify_bridge_line, validate_bridges, BridgeGrammar};

// ========== Generators ==========

fn arb_octet() -> impl Strategy<Value = u8> {
    any::<u8>()
}

fn arb_fingerprint() -> impl Strategy<Value = String> {
    "[A-F0-9]{40}"
}

// Strategy for obfs4 bridge lines on IPv4 addresses
fn arb_ipv4_bridge() -> impl Strategy<Value = String> {
    (
        prop::array::uniform4(arb_octet()),
        1u16..=65535u16,
        arb_fingerprint(),
        "[A-Za-z0-9+/]{20,70}",
    )
        .prop_map(|(ip, port, fp, cert)| {
            format!(
                "obfs4 {}.{}.{}.{}:{port} {fp} cert={cert} iat-mode=0",
                ip[0], ip[1], ip[2], ip[3]
            )
        })
}

// Strategy for snowflake bridge lines
fn arb_snowflake_bridge() -> impl Strategy<Value = String> {
    (prop::array::uniform4(arb_octet()), 1u16..=65535u16, arb_fingerprint())
        .prop_map(|(ip, port, fp)| {
            format!("snowflake {}.{}.{}.{}:{port} {fp}", ip[0], ip[1], ip[2], ip[3])
        })
}

fn arb_valid_bridge() -> impl Strategy<Value = String> {
    prop_oneof![arb_ipv4_bridge(), arb_snowflake_bridge()]
}

// Lowercase words never match: every grammar needs digits or an underscore
fn arb_garbage() -> impl Strategy<Value = String> {
    "[a-z]{1,12}( [a-z]{1,12}){0,3}"
}

#[derive(Debug, Clone)]
enum Line {
    Valid(String),
    Garbage(String),
    Blank,
}

fn arb_line() -> impl Strategy<Value = Line> {
    prop_oneof![
        3 => arb_valid_bridge().prop_map(Line::Valid),
        2 => arb_garbage().prop_map(Line::Garbage),
        1 => "[ \t]{0,4}".prop_map(|_| Line::Blank),
    ]
}

fn render(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|line| match line {
            Line::Valid(s) | Line::Garbage(s) => s.as_str(),
            Line::Blank => "",
        })
        .collect::<Vec<_>>()
        .join("\n")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property: Interleaved input keeps exactly the valid lines in order**
    #[test]
    fn prop_validation_keeps_valid_lines_in_order(lines in prop::collection::vec(arb_line(), 0..20)) {
        let expected: Vec<String> = lines
            .iter()
            .filter_map(|l| match l {
                Line::Valid(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        let rejected: Vec<String> = lines
            .iter()
            .filter_map(|l| match l {
                Line::Garbage(s) => Some(s.clone()),
                _ => None,
            })
            .collect();

        let result = validate_bridges(&render(&lines));

        prop_assert_eq!(result.accepted(), expected.as_slice());
        prop_assert_eq!(result.rejected(), rejected.as_slice());
        prop_assert_eq!(result.is_valid(), !expected.is_empty());
    }

    /// **Property: Joined bridge text is the accepted lines, newline terminated**
    #[test]
    fn prop_bridge_text_is_newline_terminated(lines in prop::collection::vec(arb_valid_bridge(), 1..8)) {
        let text = validate_bridges(&lines.join("\r\n")).to_bridge_text().unwrap();

        prop_assert!(text.ends_with('\n'));
        prop_assert_eq!(text.lines().collect::<Vec<_>>(), lines.iter().map(String::as_str).collect::<Vec<_>>());
    }

    /// **Property: Garbage-only or blank input is invalid**
    #[test]
    fn prop_garbage_only_is_invalid(lines in prop::collection::vec(arb_garbage(), 0..10)) {
        let result = validate_bridges(&lines.join("\n"));

        prop_assert!(!result.is_valid());
        prop_assert!(result.accepted().is_empty());
        prop_assert!(result.to_bridge_text().is_none());
    }

    /// **Property: IPv4 octets above 255 are rejected**
    #[test]
    fn prop_out_of_range_octet_rejected(
        octet in 256u16..=999u16,
        position in 0usize..4,
        fp in arb_fingerprint(),
    ) {
        let mut parts = ["10", "0", "0", "1"].map(String::from);
        parts[position] = octet.to_string();
        let line = format!("obfs4 {}:443 {fp} cert=abc", parts.join("."));

        prop_assert_ne!(classify_bridge_line(&line), Some(BridgeGrammar::Ipv4));
    }

    /// **Property: Classification is a pure function of the line**
    #[test]
    fn prop_classification_is_stable(line in arb_valid_bridge()) {
        let first = classify_bridge_line(&line);
        prop_assert!(first.is_some());
        prop_assert_eq!(first, classify_bridge_line(&line));
    }
}
