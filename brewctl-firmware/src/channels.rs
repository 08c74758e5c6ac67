//! Inter-task communication channels
//!
//! Defines the static signals used for communication between Embassy tasks.
//! The supervisor itself is shared through a mutex (see `controller`); these
//! carry work that must happen outside the supervisor lock.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use brewctl_core::control::PidTunings;
use brewctl_core::AutotuneConfig;

/// Start an autotune session (from the serial command intake)
pub static AUTOTUNE_CMD: Signal<CriticalSectionRawMutex, AutotuneConfig> = Signal::new();

/// Cancel a running autotune session
pub static AUTOTUNE_CANCEL: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Calibration offset (°C) to persist
pub static CALIBRATION_SAVE: Signal<CriticalSectionRawMutex, f32> = Signal::new();

/// Autotuned gains to persist
pub static TUNINGS_SAVE: Signal<CriticalSectionRawMutex, PidTunings> = Signal::new();

/// Graceful shutdown requested
pub static SHUTDOWN: Signal<CriticalSectionRawMutex, ()> = Signal::new();
