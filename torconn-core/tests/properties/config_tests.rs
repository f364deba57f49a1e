//! Property-based tests for settings round-trip through ConfigManager
//!
//! **Property: Settings Persistence Round-Trip**

use proptest::prelude::*;
use secrecy::SecretString;
use tempfile::TempDir;
use torconn_core::config::{AppSettings, ConfigManager, ConnectionSettings, SettingsStore};
use torconn_core::models::{AuthMode, BridgeMode, BuiltinBridge, ConnectionMode, TorSettings};

// ========== Generators ==========

fn arb_bridge_mode() -> impl Strategy<Value = BridgeMode> {
    prop_oneof![
        Just(BridgeMode::None),
        Just(BridgeMode::Builtin(BuiltinBridge::Obfs4)),
        Just(BridgeMode::Builtin(BuiltinBridge::MeekAzure)),
        Just(BridgeMode::Builtin(BuiltinBridge::Snowflake)),
        "([a-z0-9 .:]{1,30}\n){1,3}".prop_map(BridgeMode::Moat),
        "([a-z0-9 .:]{1,30}\n){1,3}".prop_map(BridgeMode::Custom),
    ]
}

prop_compose! {
    fn arb_tor_settings()(
        connection_mode in prop_oneof![
            Just(ConnectionMode::Bundled),
            Just(ConnectionMode::Automatic),
            Just(ConnectionMode::ControlPort),
            Just(ConnectionMode::SocketFile),
        ],
        control_port_address in "[0-9.]{0,15}",
        control_port_port in "[0-9]{0,5}",
        socket_file_path in "(/[a-z_]{1,8}){0,4}",
        socks_address in "[0-9.]{0,15}",
        socks_port in "[0-9]{0,5}",
        password_auth in any::<bool>(),
        password in "[ -~]{0,24}",
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

prop_compose! {
    fn arb_connection_settings()(
        local_only in any::<bool>(),
        timeout_secs in 0u64..600,
        reconnect_on_moat_change in any::<bool>(),
    ) -> ConnectionSettings {
        ConnectionSettings { local_only, timeout_secs, reconnect_on_moat_change }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// **Property: Settings Persistence Round-Trip**
    ///
    /// For any settings, saving then loading gives back equal settings.
    #[test]
    fn prop_app_settings_round_trip(
        tor in arb_tor_settings(),
        connection in arb_connection_settings(),
    ) {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_config_dir(temp_dir.path().to_path_buf());
        let settings = AppSettings { connection, tor };

        manager.save_settings(&settings).unwrap();
        let loaded = manager.load_settings().unwrap();

        prop_assert_eq!(loaded, settings);
    }

    /// **Property: Saving through the store keeps the connection section**
    #[test]
    fn prop_store_save_keeps_other_sections(
        first in arb_tor_settings(),
        second in arb_tor_settings(),
        connection in arb_connection_settings(),
    ) {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_config_dir(temp_dir.path().to_path_buf());
        manager
            .save_settings(&AppSettings { connection: connection.clone(), tor: first })
            .unwrap();

        SettingsStore::save(&manager, &second).unwrap();

        prop_assert_eq!(SettingsStore::load(&manager).unwrap(), second);
        prop_assert_eq!(manager.load_settings().unwrap().connection, connection);
    }
}
