//! Safety monitoring
//!
//! Runs on its own cadence, independent of the control tick, and acts on
//! the supervisor only through its public operations.

pub mod monitor;

pub use monitor::{SafetyMonitor, SafetyStatus};
