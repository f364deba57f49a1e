//! Property-based tests for TorConn core library

mod bridge_tests;
mod config_tests;
mod diff_tests;
mod orchestrator_tests;
