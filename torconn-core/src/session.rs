//! Tor session abstraction
//!
//! A session is one connection to a Tor controller. The orchestrator owns
//! the live session exclusively and asks a `SessionFactory` for throwaway
//! sessions when settings are only being tested.

use async_trait::async_trait;

use crate::error::ConnectResult;
use crate::models::{TorSettings, TorStatus};

/// A connection to a Tor instance
///
/// `connect` may take a long time. Callers race it against cancellation
/// and drop the future when the user gives up, then call `cleanup` so no
/// half-open connection is left behind.
#[async_trait]
pub trait TorSession: Send + Sync {
    /// Returns true once `connect` has succeeded and until `cleanup`
    fn is_authenticated(&self) -> bool;

    /// Connects and authenticates using `settings`
    ///
    /// # Errors
    /// Returns `ConnectError` if Tor can't be reached or rejects us
    async fn connect(&mut self, settings: &TorSettings) -> ConnectResult<TorStatus>;

    /// Closes the connection and releases everything the session holds
    async fn cleanup(&mut self);
}

/// Creates isolated sessions for testing settings
///
/// An isolated session never touches the live one and is discarded once
/// the test finishes.
pub trait SessionFactory: Send + Sync {
    /// Returns a new, unconnected session
    fn isolated_session(&self) -> Box<dyn TorSession>;
}
