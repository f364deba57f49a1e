//! Test and save orchestration
//!
//! `SettingsOrchestrator` drives a form through validation, an optional
//! connection attempt and persistence. It owns the live Tor session, so
//! `run` taking `&mut self` rules out two actions in flight at once.

use std::time::Duration;

use crate::builder::SettingsForm;
use crate::config::{ConnectionSettings, SettingsStore};
use crate::diff::{ReconnectDecision, ReconnectPolicy};
use crate::error::{ConfigResult, ConnectError, ConnectResult, SettingsError, SettingsResult};
use crate::models::{TorSettings, TorStatus};
use crate::progress::{CancelHandle, NoOpObserver, OrchestratorState, StateObserver};
use crate::session::{SessionFactory, TorSession};

/// What the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Try the settings on a throwaway session
    Test,
    /// Apply and persist the settings
    Save,
}

/// Result of a successful action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The settings worked; reports what the Tor instance supports
    Tested(TorStatus),
    /// The settings were persisted
    Saved {
        /// Whether the live session was reconnected
        reconnected: bool,
        /// Status of the new connection, when one was made
        status: Option<TorStatus>,
    },
}

/// Knobs for the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrchestratorOptions {
    /// Which fields force a reconnect on save
    pub policy: ReconnectPolicy,
    /// Never connect to Tor; saving only persists
    pub local_only: bool,
    /// Give up on a connection attempt after this long
    pub timeout: Option<Duration>,
}

impl From<&ConnectionSettings> for OrchestratorOptions {
    fn from(settings: &ConnectionSettings) -> Self {
        Self {
            policy: settings.reconnect_policy(),
            local_only: settings.local_only,
            timeout: (settings.timeout_secs > 0).then(|| settings.timeout()),
        }
    }
}

/// Runs Test and Save actions against a live session and a settings store
pub struct SettingsOrchestrator<S, F, St> {
    session: S,
    factory: F,
    store: St,
    previous: TorSettings,
    state: OrchestratorState,
    options: OrchestratorOptions,
    observer: Box<dyn StateObserver>,
}

impl<S, F, St> SettingsOrchestrator<S, F, St>
where
    S: TorSession,
    F: SessionFactory,
    St: SettingsStore,
{
    /// Creates an orchestrator, loading the saved settings as the baseline
    ///
    /// # Errors
    /// Returns `ConfigError` if the saved settings can't be read
    pub fn new(
        session: S,
        factory: F,
        store: St,
        options: OrchestratorOptions,
    ) -> ConfigResult<Self> {
        let previous = store.load()?;
        Ok(Self {
            session,
            factory,
            store,
            previous,
            state: OrchestratorState::Idle,
            options,
            observer: Box::new(NoOpObserver),
        })
    }

    /// Reports every state transition to `observer`
    #[must_use]
    pub fn with_observer(mut self, observer: impl StateObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// The settings currently considered applied
    #[must_use]
    pub const fn previous(&self) -> &TorSettings {
        &self.previous
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> OrchestratorState {
        self.state
    }

    /// The live session
    #[must_use]
    pub const fn session(&self) -> &S {
        &self.session
    }

    /// Options in effect
    #[must_use]
    pub const fn options(&self) -> &OrchestratorOptions {
        &self.options
    }

    /// True when closing the settings should quit the application, which
    /// is the case when Tor isn't connected and we aren't running local-only
    #[must_use]
    pub fn should_quit_on_close(&self) -> bool {
        !self.options.local_only && !self.session.is_authenticated()
    }

    /// Validates `form` and performs `action`
    ///
    /// # Errors
    /// Returns a validation error if the form is invalid,
    /// `ConnectionFailed` or `ConnectionCancelled` if the attempt didn't
    /// succeed, or `Save` if the settings couldn't be persisted.
    pub async fn run(
        &mut self,
        action: Action,
        form: &SettingsForm,
        cancel: &CancelHandle,
    ) -> SettingsResult<Outcome> {
        self.transition(OrchestratorState::Validating);
        let candidate = match form.build() {
            Ok(candidate) => candidate,
            Err(e) => return Err(self.fail(e)),
        };

        match action {
            Action::Test => self.test(&candidate, cancel).await,
            Action::Save => self.save(candidate, cancel).await,
        }
    }

    async fn test(
        &mut self,
        candidate: &TorSettings,
        cancel: &CancelHandle,
    ) -> SettingsResult<Outcome> {
        self.transition(OrchestratorState::Connecting);
        let mut session = self.factory.isolated_session();
        let result = attempt(session.as_mut(), candidate, cancel, self.options.timeout).await;
        session.cleanup().await;

        match result {
            Ok(status) => {
                tracing::info!(version = %status.tor_version, "Tor settings test succeeded");
                self.transition(OrchestratorState::Succeeded);
                Ok(Outcome::Tested(status))
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    async fn save(
        &mut self,
        candidate: TorSettings,
        cancel: &CancelHandle,
    ) -> SettingsResult<Outcome> {
        if self.options.local_only {
            tracing::info!("local-only mode, saving without connecting");
            self.persist(candidate)?;
            self.transition(OrchestratorState::Succeeded);
            return Ok(Outcome::Saved {
                reconnected: false,
                status: None,
            });
        }

        let authenticated = self.session.is_authenticated();
        let decision = self
            .options
            .policy
            .decide(&candidate, &self.previous, authenticated);
        if decision == ReconnectDecision::NoActionNeeded {
            tracing::info!("Tor settings unchanged, keeping the current connection");
            self.persist(candidate)?;
            self.transition(OrchestratorState::Succeeded);
            return Ok(Outcome::Saved {
                reconnected: false,
                status: None,
            });
        }

        tracing::info!("Tor settings changed, reconnecting");
        self.transition(OrchestratorState::Connecting);
        self.session.cleanup().await;
        match attempt(&mut self.session, &candidate, cancel, self.options.timeout).await {
            Ok(status) => {
                if let Err(e) = self.persist(candidate) {
                    self.session.cleanup().await;
                    return Err(e);
                }
                self.transition(OrchestratorState::Succeeded);
                Ok(Outcome::Saved {
                    reconnected: true,
                    status: Some(status),
                })
            }
            Err(e) => {
                self.session.cleanup().await;
                Err(self.fail(e.into()))
            }
        }
    }

    fn persist(&mut self, candidate: TorSettings) -> SettingsResult<()> {
        if let Err(e) = self.store.save(&candidate) {
            return Err(self.fail(SettingsError::Save(e)));
        }
        self.previous = candidate;
        Ok(())
    }

    fn transition(&mut self, state: OrchestratorState) {
        tracing::debug!(from = ?self.state, to = ?state, "orchestrator state");
        self.state = state;
        self.observer.state_changed(state);
    }

    fn fail(&mut self, error: SettingsError) -> SettingsError {
        tracing::warn!(%error, "Tor settings action failed");
        self.transition(OrchestratorState::Failed);
        error
    }
}

/// Connects `session`, giving up on cancellation or after `timeout`
async fn attempt<T>(
    session: &mut T,
    settings: &TorSettings,
    cancel: &CancelHandle,
    timeout: Option<Duration>,
) -> ConnectResult<TorStatus>
where
    T: TorSession + ?Sized,
{
    let connect = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, session.connect(settings))
                .await
                .unwrap_or_else(|_| Err(ConnectError::Timeout(limit.as_secs()))),
            None => session.connect(settings).await,
        }
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ConnectError::Cancelled),
        result = connect => result,
    }
}
