//! Progress reporting for Tor connection attempts.
//!
//! This module provides the states an orchestrated test or save goes
//! through, observers that receive those transitions, and a handle for
//! cancelling an attempt from another task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// State of a test or save action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestratorState {
    /// Nothing in flight
    #[default]
    Idle,
    /// Building settings from the form
    Validating,
    /// Waiting for a Tor connection attempt
    Connecting,
    /// The action finished successfully
    Succeeded,
    /// The action failed or was cancelled
    Failed,
}

impl OrchestratorState {
    /// Returns true for `Succeeded` and `Failed`
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true while an action is running
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Validating | Self::Connecting)
    }
}

/// Trait for observing state transitions.
///
/// The presentation layer implements this to show a spinner while
/// connecting and to re-enable its buttons afterwards.
pub trait StateObserver: Send + Sync {
    /// Called every time the orchestrator enters a new state
    fn state_changed(&self, state: OrchestratorState);
}

/// An observer that invokes a callback for each transition.
pub struct CallbackObserver<F>
where
    F: Fn(OrchestratorState) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackObserver<F>
where
    F: Fn(OrchestratorState) + Send + Sync,
{
    /// Creates a new callback-based observer.
    #[must_use]
    pub const fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> StateObserver for CallbackObserver<F>
where
    F: Fn(OrchestratorState) + Send + Sync,
{
    fn state_changed(&self, state: OrchestratorState) {
        (self.callback)(state);
    }
}

/// An observer that ignores all transitions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpObserver;

impl StateObserver for NoOpObserver {
    fn state_changed(&self, _state: OrchestratorState) {
        // No-op
    }
}

/// A handle for cancelling a connection attempt from another task.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    /// Creates a handle that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation and wakes any task waiting on `cancelled()`.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Returns true if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Completes once `cancel()` has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
