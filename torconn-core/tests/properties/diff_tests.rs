//! Property-based tests for reconnect decisions
//!
//! **Property: Identical settings never reconnect, unauthenticated always does**

use proptest::prelude::*;
use secrecy::SecretString;
use torconn_core::diff::{decide, ReconnectDecision, ReconnectPolicy, SettingField};
use torconn_core::models::{AuthMode, BridgeMode, BuiltinBridge, ConnectionMode, TorSettings};

// ========== Generators ==========

fn arb_bridge_mode() -> impl Strategy<Value = BridgeMode> {
    prop_oneof![
        Just(BridgeMode::None),
        Just(BridgeMode::Builtin(BuiltinBridge::Obfs4)),
        Just(BridgeMode::Builtin(BuiltinBridge::MeekAzure)),
        Just(BridgeMode::Builtin(BuiltinBridge::Snowflake)),
        "[a-z0-9 ]{1,20}\n".prop_map(BridgeMode::Moat),
        "[a-z0-9 ]{1,20}\n".prop_map(BridgeMode::Custom),
    ]
}

prop_compose! {
    fn arb_settings()(
        connection_mode in prop_oneof![
            Just(ConnectionMode::Bundled),
            Just(ConnectionMode::Automatic),
            Just(ConnectionMode::ControlPort),
            Just(ConnectionMode::SocketFile),
        ],
        control_port_address in "[0-9.]{1,15}",
        control_port_port in "[0-9]{1,5}",
        socket_file_path in "/[a-z]{1,10}",
        socks_address in "[0-9.]{1,15}",
        socks_port in "[0-9]{1,5}",
        password_auth in any::<bool>(),
        password in "[a-z]{0,8}",
        bridge_mode in arb_bridge_mode(),
    ) -> TorSettings {
        TorSettings {
            connection_mode,
            control_port_address,
            control_port_port,
            socket_file_path,
            socks_address,
            socks_port,
            auth_mode: if password_auth { AuthMode::Password } else { AuthMode::NoAuth },
            auth_password: SecretString::from(password),
            bridge_mode,
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// **Property: Comparing settings with themselves needs no action**
    #[test]
    fn prop_identical_settings_need_nothing(settings in arb_settings(), moat in any::<bool>()) {
        let policy = ReconnectPolicy { compare_moat_bridges: moat };
        prop_assert_eq!(
            policy.decide(&settings, &settings.clone(), true),
            ReconnectDecision::NoActionNeeded
        );
        prop_assert!(policy.changed_fields(&settings, &settings).is_empty());
    }

    /// **Property: Without an authenticated session a reconnect is always needed**
    #[test]
    fn prop_unauthenticated_must_reconnect(a in arb_settings(), b in arb_settings()) {
        prop_assert_eq!(decide(&a, &b, false), ReconnectDecision::MustReconnect);
    }

    /// **Property: The decision is MustReconnect exactly when some field differs**
    #[test]
    fn prop_decision_matches_changed_fields(a in arb_settings(), b in arb_settings(), moat in any::<bool>()) {
        let policy = ReconnectPolicy { compare_moat_bridges: moat };
        let changed = policy.changed_fields(&a, &b);
        let expected = if changed.is_empty() {
            ReconnectDecision::NoActionNeeded
        } else {
            ReconnectDecision::MustReconnect
        };
        prop_assert_eq!(policy.decide(&a, &b, true), expected);
        prop_assert_eq!(changed.contains(&SettingField::MoatBridges), moat && a.bridge_mode.moat_bridges() != b.bridge_mode.moat_bridges());
    }

    /// **Property: Changing only the password forces a reconnect**
    #[test]
    fn prop_password_change_reconnects(settings in arb_settings(), other in "[A-Z]{1,8}") {
        let changed = TorSettings {
            auth_password: SecretString::from(other),
            ..settings.clone()
        };
        prop_assert_eq!(decide(&changed, &settings, true), ReconnectDecision::MustReconnect);
    }

    /// **Property: Moat lines alone don't reconnect under the default policy**
    #[test]
    fn prop_moat_text_ignored_by_default(
        settings in arb_settings(),
        old in "[a-z]{1,10}\n",
        new in "[0-9]{1,10}\n",
    ) {
        let previous = TorSettings { bridge_mode: BridgeMode::Moat(old), ..settings.clone() };
        let candidate = TorSettings { bridge_mode: BridgeMode::Moat(new), ..settings };
        prop_assert_eq!(decide(&candidate, &previous, true), ReconnectDecision::NoActionNeeded);

        let policy = ReconnectPolicy { compare_moat_bridges: true };
        prop_assert_eq!(policy.decide(&candidate, &previous, true), ReconnectDecision::MustReconnect);
    }
}
