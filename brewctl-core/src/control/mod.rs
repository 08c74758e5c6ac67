//! Temperature control
//!
//! The PID algorithm, the supervisor that owns all actuation state, mash
//! step programs and the telemetry snapshot.

pub mod mash;
pub mod pid;
pub mod supervisor;
pub mod telemetry;

pub use mash::{MashProgram, MashStep, MAX_MASH_STEPS};
pub use pid::{OutputLimits, PidController, PidTunings, DEFAULT_DT_S};
pub use supervisor::{CommandError, ParamEffect, Supervisor};
pub use telemetry::Telemetry;
