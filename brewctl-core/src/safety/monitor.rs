//! Safety monitor implementation
//!
//! Two checks per cycle:
//!
//! - **Fault latch**: a counter goes up by one for every invalid reading
//!   and down by one (never below zero) for every valid one. Reaching
//!   `max_faults` disables the heater and moves the stage to `Fault`. Good
//!   readings decay the counter but never re-enable the heater.
//! - **Overheat pause**: a reading above `setpoint + margin` while the
//!   heater is enabled stops heating without touching `heater_enabled`.
//!   Heating resumes once the reading drops below the margin minus the
//!   hysteresis.

use crate::config::ControllerConfig;
use crate::control::Supervisor;
use crate::traits::{Clock, HeaterOutput, PumpOutput, TemperatureSensor};

/// Safety condition after a check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// All conditions normal
    Ok,
    /// Heating paused above the overheat margin
    OverheatPaused,
    /// Sensor fault latched; operator action required
    FaultLatched,
}

/// Fault counter and overheat guard
#[derive(Debug, Clone)]
pub struct SafetyMonitor {
    fault_count: u8,
    max_faults: u8,
    overheat_margin_c: f32,
    resume_hysteresis_c: f32,
}

impl Default for SafetyMonitor {
    fn default() -> Self {
        Self::new(&ControllerConfig::default())
    }
}

impl SafetyMonitor {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            fault_count: 0,
            max_faults: config.max_faults.max(1),
            overheat_margin_c: config.overheat_margin_c,
            resume_hysteresis_c: config.overheat_hysteresis_c,
        }
    }

    /// Run one safety cycle against the supervisor's latest reading
    pub fn check<S, H, P, C>(&mut self, sup: &mut Supervisor<S, H, P, C>) -> SafetyStatus
    where
        S: TemperatureSensor,
        H: HeaterOutput,
        P: PumpOutput,
        C: Clock,
    {
        if sup.reading_valid() {
            self.fault_count = self.fault_count.saturating_sub(1);
        } else {
            self.fault_count = (self.fault_count + 1).min(self.max_faults);
        }

        if self.fault_count >= self.max_faults && (sup.heater_enabled() || !sup.stage().is_fault())
        {
            if !sup.stage().is_fault() {
                #[cfg(feature = "defmt")]
                defmt::error!(
                    "Sensor fault latched after {} bad readings (last {}C)",
                    self.fault_count,
                    sup.temperature()
                );
            }
            sup.latch_fault();
        }

        if sup.stage().is_fault() {
            return SafetyStatus::FaultLatched;
        }

        if sup.reading_valid() {
            let limit = sup.overheat_reference() + self.overheat_margin_c;
            let temperature = sup.temperature();

            if temperature > limit && sup.heater_enabled() {
                if sup.heating_on() {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Overheat: {}C > {}C, pausing heating", temperature, limit);
                }
                sup.pause_for_overheat();
            } else if sup.overheat_paused()
                && temperature <= limit - self.resume_hysteresis_c
            {
                #[cfg(feature = "defmt")]
                defmt::info!("Temperature back to {}C, resuming heating", temperature);
                sup.resume_after_overheat();
            }
        }

        if sup.overheat_paused() {
            SafetyStatus::OverheatPaused
        } else {
            SafetyStatus::Ok
        }
    }

    /// Current debounce counter
    pub fn fault_count(&self) -> u8 {
        self.fault_count
    }

    pub fn max_faults(&self) -> u8 {
        self.max_faults
    }
}
