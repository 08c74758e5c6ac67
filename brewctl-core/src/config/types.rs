//! Controller configuration

use serde::{Deserialize, Serialize};

use crate::control::{OutputLimits, PidTunings};

/// Every tunable the controller needs, with the brewing defaults
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Setpoint at boot (°C)
    pub setpoint_c: f32,
    /// Gains used when nothing has been persisted
    pub tunings: PidTunings,
    /// PID output clamp (heater %)
    pub output_limits: OutputLimits,
    /// Lowest plausible reading (°C)
    pub valid_min_c: f32,
    /// Highest plausible reading (°C)
    pub valid_max_c: f32,
    /// Consecutive bad readings before the fault latch trips
    pub max_faults: u8,
    /// Overheat pause above `setpoint + margin` (°C)
    pub overheat_margin_c: f32,
    /// Heating resumes below `setpoint + margin - hysteresis` (°C)
    pub overheat_hysteresis_c: f32,
    /// Band around a mash step target that counts as "at temperature" (°C)
    pub mash_tolerance_c: f32,
    /// Control tick period (ms)
    pub control_interval_ms: u32,
    /// Safety check period (ms)
    pub safety_interval_ms: u32,
    /// Telemetry log period (ms)
    pub telemetry_interval_ms: u32,
    /// Autotune sampling period (ms)
    pub autotune_sample_ms: u32,
    /// Autotune gives up after this long (ms)
    pub autotune_timeout_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            setpoint_c: 65.0,
            tunings: PidTunings::new(2.0, 0.1, 0.05),
            output_limits: OutputLimits::new(0.0, 100.0),
            valid_min_c: 0.0,
            valid_max_c: 100.0,
            max_faults: 3,
            overheat_margin_c: 5.0,
            overheat_hysteresis_c: 1.0,
            mash_tolerance_c: 1.0,
            control_interval_ms: 100,
            safety_interval_ms: 1_000,
            telemetry_interval_ms: 60_000,
            autotune_sample_ms: 500,
            autotune_timeout_ms: 30 * 60 * 1_000,
        }
    }
}

impl ControllerConfig {
    /// Check whether a reading lies in the plausible range (inclusive)
    pub fn in_valid_range(&self, temperature_c: f32) -> bool {
        temperature_c >= self.valid_min_c && temperature_c <= self.valid_max_c
    }

    /// Sanity-check the configuration
    pub fn is_valid(&self) -> bool {
        self.valid_min_c < self.valid_max_c
            && self.max_faults > 0
            && self.overheat_margin_c > 0.0
            && self.overheat_hysteresis_c >= 0.0
            && self.overheat_hysteresis_c < self.overheat_margin_c
            && self.control_interval_ms > 0
            && self.safety_interval_ms > 0
            && self.autotune_sample_ms > 0
    }
}
