//! Board-agnostic control logic for the brewing controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (sensor, heater, pump, clock)
//! - PID controller with anti-windup
//! - Control supervisor owning the actuation state
//! - Safety monitoring (sensor fault latch, overheat pause)
//! - Relay-feedback autotune
//! - Stage state machine and mash step programs
//! - Configuration and calibration persistence

#![no_std]
#![deny(unsafe_code)]

pub mod autotune;
pub mod config;
pub mod control;
pub mod safety;
pub mod state;
pub mod traits;

#[cfg(test)]
mod testing;

pub use autotune::{AutotuneConfig, AutotuneError, AutotuneResult, AutotuneState, Autotuner};
pub use control::{PidController, Supervisor, Telemetry};
pub use safety::{SafetyMonitor, SafetyStatus};
pub use state::{Event, Stage};
