//! Integration test infrastructure for the configuration core
//!
//! Provides:
//! - A builder for contextualization snapshots
//! - Canned control-plane documents behind a [`StaticGate`]
//!
//! [`StaticGate`]: vrouter_gate::StaticGate

pub mod fixtures;

pub use fixtures::*;
