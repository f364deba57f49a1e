//! Property-based tests for the test and save orchestration
//!
//! **Property: Test never persists, failed saves keep the baseline**

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use proptest::prelude::*;
use torconn_core::builder::{BridgeSource, SettingsForm};
use torconn_core::config::SettingsStore;
use torconn_core::error::{ConfigResult, ConnectError, ConnectResult};
use torconn_core::models::{BuiltinBridge, ConnectionMode, TorSettings, TorStatus};
use torconn_core::orchestrator::{Action, OrchestratorOptions, SettingsOrchestrator};
use torconn_core::progress::{CancelHandle, OrchestratorState};
use torconn_core::session::{SessionFactory, TorSession};

#[derive(Default)]
struct Counters {
    connects: AtomicUsize,
    cleanups: AtomicUsize,
}

struct FakeSession {
    succeed: bool,
    authenticated: bool,
    counters: Arc<Counters>,
}

#[async_trait]
impl TorSession for FakeSession {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    async fn connect(&mut self, _settings: &TorSettings) -> ConnectResult<TorStatus> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        if self.succeed {
            self.authenticated = true;
            Ok(TorStatus::from_version("0.4.8.9"))
        } else {
            Err(ConnectError::Unreachable("refused".to_string()))
        }
    }

    async fn cleanup(&mut self) {
        self.authenticated = false;
        self.counters.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeFactory {
    succeed: bool,
    counters: Arc<Counters>,
}

impl SessionFactory for FakeFactory {
    fn isolated_session(&self) -> Box<dyn TorSession> {
        Box::new(FakeSession {
            succeed: self.succeed,
            authenticated: false,
            counters: Arc::clone(&self.counters),
        })
    }
}

#[derive(Default)]
struct FakeStore {
    saved: Arc<Mutex<Vec<TorSettings>>>,
}

impl SettingsStore for FakeStore {
    fn load(&self) -> ConfigResult<TorSettings> {
        Ok(TorSettings::default())
    }

    fn save(&self, settings: &TorSettings) -> ConfigResult<()> {
        self.saved.lock().unwrap().push(settings.clone());
        Ok(())
    }
}

// ========== Generators ==========

prop_compose! {
    fn arb_form()(
        connection_mode in prop_oneof![
            Just(ConnectionMode::Bundled),
            Just(ConnectionMode::Automatic),
            Just(ConnectionMode::ControlPort),
            Just(ConnectionMode::SocketFile),
        ],
        control_port_port in "[0-9]{1,5}",
        use_bridges in any::<bool>(),
        bridge_source in prop_oneof![
            Just(BridgeSource::Builtin),
            Just(BridgeSource::Moat),
            Just(BridgeSource::Custom),
        ],
        builtin_bridge in prop_oneof![
            Just(BuiltinBridge::Obfs4),
            Just(BuiltinBridge::MeekAzure),
            Just(BuiltinBridge::Snowflake),
        ],
        moat_bridges in "[a-z ]{0,12}",
    ) -> SettingsForm {
        SettingsForm {
            connection_mode,
            control_port_port,
            use_bridges,
            bridge_source,
            builtin_bridge,
            moat_bridges,
            ..SettingsForm::default()
        }
    }
}

struct Setup {
    orchestrator: SettingsOrchestrator<FakeSession, FakeFactory, FakeStore>,
    live: Arc<Counters>,
    isolated: Arc<Counters>,
    saved: Arc<Mutex<Vec<TorSettings>>>,
}

fn setup(succeed: bool, authenticated: bool) -> Setup {
    let live = Arc::new(Counters::default());
    let isolated = Arc::new(Counters::default());
    let store = FakeStore::default();
    let saved = Arc::clone(&store.saved);
    let orchestrator = SettingsOrchestrator::new(
        FakeSession {
            succeed,
            authenticated,
            counters: Arc::clone(&live),
        },
        FakeFactory {
            succeed,
            counters: Arc::clone(&isolated),
        },
        store,
        OrchestratorOptions::default(),
    )
    .unwrap();
    Setup {
        orchestrator,
        live,
        isolated,
        saved,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// **Property: Test never persists and always cleans up its session**
    #[test]
    fn prop_test_never_persists(
        form in arb_form(),
        succeed in any::<bool>(),
        authenticated in any::<bool>(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut s = setup(succeed, authenticated);

        let result = rt.block_on(s.orchestrator.run(Action::Test, &form, &CancelHandle::new()));

        prop_assert!(s.saved.lock().unwrap().is_empty());
        prop_assert_eq!(s.live.connects.load(Ordering::SeqCst), 0);
        prop_assert_eq!(s.live.cleanups.load(Ordering::SeqCst), 0);
        prop_assert_eq!(
            s.isolated.connects.load(Ordering::SeqCst),
            s.isolated.cleanups.load(Ordering::SeqCst)
        );
        prop_assert_eq!(s.orchestrator.previous(), &TorSettings::default());
        let expected = if result.is_ok() { OrchestratorState::Succeeded } else { OrchestratorState::Failed };
        prop_assert_eq!(s.orchestrator.state(), expected);
    }

    /// **Property: A failed save keeps the previous baseline**
    #[test]
    fn prop_failed_save_keeps_baseline(form in arb_form(), authenticated in any::<bool>()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut s = setup(false, authenticated);

        let result = rt.block_on(s.orchestrator.run(Action::Save, &form, &CancelHandle::new()));

        if result.is_err() {
            prop_assert!(s.saved.lock().unwrap().is_empty());
            prop_assert_eq!(s.orchestrator.previous(), &TorSettings::default());
            if form.build().is_ok() {
                prop_assert!(!s.orchestrator.session().is_authenticated());
            }
        } else {
            // Only an unchanged save on a live session can succeed here
            prop_assert!(authenticated);
            prop_assert_eq!(s.live.connects.load(Ordering::SeqCst), 0);
        }
    }

    /// **Property: A successful save becomes the new baseline**
    #[test]
    fn prop_successful_save_updates_baseline(form in arb_form(), authenticated in any::<bool>()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut s = setup(true, authenticated);

        let result = rt.block_on(s.orchestrator.run(Action::Save, &form, &CancelHandle::new()));

        if let Ok(candidate) = form.build() {
            prop_assert!(result.is_ok());
            prop_assert_eq!(s.orchestrator.previous(), &candidate);
            let saved = s.saved.lock().unwrap().last().cloned();
            prop_assert_eq!(saved.as_ref(), Some(&candidate));
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(s.live.connects.load(Ordering::SeqCst), 0);
        }
    }

    /// **Property: Cancelling before the attempt never persists**
    #[test]
    fn prop_cancelled_save_persists_nothing(form in arb_form()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut s = setup(true, false);
        let cancel = CancelHandle::new();
        cancel.cancel();

        let result = rt.block_on(s.orchestrator.run(Action::Save, &form, &cancel));

        prop_assert!(result.is_err());
        prop_assert!(s.saved.lock().unwrap().is_empty());
        prop_assert_eq!(s.orchestrator.previous(), &TorSettings::default());
    }
}
