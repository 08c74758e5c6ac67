//! PID controller
//!
//! Discrete PID with derivative-on-measurement and integral rollback
//! anti-windup. Time between calls comes from a pluggable [`Clock`] unless
//! the caller supplies `dt` explicitly.

use serde::{Deserialize, Serialize};

use crate::traits::Clock;

/// Fallback sample interval (s) for the first call or a stalled clock
pub const DEFAULT_DT_S: f32 = 0.1;

/// PID gains
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidTunings {
    /// Proportional gain (Kp)
    pub kp: f32,
    /// Integral gain (Ki)
    pub ki: f32,
    /// Derivative gain (Kd)
    pub kd: f32,
}

impl PidTunings {
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }

    /// Check if any gain is non-zero
    pub fn is_configured(&self) -> bool {
        self.kp != 0.0 || self.ki != 0.0 || self.kd != 0.0
    }
}

/// Output clamp, either side may be unbounded
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputLimits {
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl OutputLimits {
    pub const fn new(min: f32, max: f32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub const fn unbounded() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// Clamp `value`, reporting whether it ended up on a limit
    fn apply(&self, value: f32) -> (f32, bool) {
        let mut output = value;
        if let Some(min) = self.min {
            if output < min {
                output = min;
            }
        }
        if let Some(max) = self.max {
            if output > max {
                output = max;
            }
        }

        let at_min = self.min.is_some_and(|min| output <= min);
        let at_max = self.max.is_some_and(|max| output >= max);
        (output, at_min || at_max)
    }
}

/// Discrete PID controller
pub struct PidController<C> {
    clock: C,
    tunings: PidTunings,
    setpoint: f32,
    limits: OutputLimits,
    auto_mode: bool,
    integral: f32,
    last_measurement: Option<f32>,
    last_time_ms: Option<u64>,
    last_output: f32,
}

impl<C: Clock> PidController<C> {
    /// Create a controller in auto mode with the given gains and clamp
    pub fn new(clock: C, tunings: PidTunings, limits: OutputLimits) -> Self {
        Self {
            clock,
            tunings,
            setpoint: 0.0,
            limits,
            auto_mode: true,
            integral: 0.0,
            last_measurement: None,
            last_time_ms: None,
            last_output: 0.0,
        }
    }

    /// Compute the next output for `measurement`
    ///
    /// With `dt == None` the interval is taken from the clock. The first
    /// call after a reset, and any non-positive interval, use
    /// [`DEFAULT_DT_S`]. In manual mode the last output is held.
    pub fn compute(&mut self, measurement: f32, dt: Option<f32>) -> f32 {
        if !self.auto_mode {
            return self.last_output;
        }

        let now = self.clock.now_ms();
        let dt = match (dt, self.last_time_ms) {
            (Some(dt), _) => dt,
            (None, Some(last)) => now.saturating_sub(last) as f32 / 1000.0,
            (None, None) => DEFAULT_DT_S,
        };
        // Also catches NaN
        let dt = if dt > 0.0 { dt } else { DEFAULT_DT_S };
        self.last_time_ms = Some(now);

        let error = self.setpoint - measurement;

        let proportional = self.tunings.kp * error;

        let increment = error * dt;
        self.integral += increment;
        let integral = self.tunings.ki * self.integral;

        // Derivative on measurement avoids a kick on setpoint changes
        let derivative = match self.last_measurement {
            Some(last) => self.tunings.kd * (measurement - last) / dt,
            None => 0.0,
        };

        let (output, saturated) = self.limits.apply(proportional + integral - derivative);

        // Anti-windup: drop the contribution that drove us into the limit
        if saturated {
            self.integral -= increment;
        }

        self.last_measurement = Some(measurement);
        self.last_output = output;

        output
    }

    /// Reset internal state (integral, history, last output)
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_measurement = None;
        self.last_time_ms = None;
        self.last_output = 0.0;
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    pub fn set_setpoint(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    pub fn tunings(&self) -> PidTunings {
        self.tunings
    }

    /// Replace all three gains at once; internal state is kept
    pub fn set_tunings(&mut self, tunings: PidTunings) {
        self.tunings = tunings;
    }

    pub fn output_limits(&self) -> OutputLimits {
        self.limits
    }

    pub fn set_output_limits(&mut self, limits: OutputLimits) {
        self.limits = limits;
    }

    pub fn auto_mode(&self) -> bool {
        self.auto_mode
    }

    /// Switch between auto and manual (output hold) mode
    ///
    /// Switching from manual to auto resets the controller so stale
    /// integral and history do not bump the output.
    pub fn set_auto_mode(&mut self, enabled: bool) {
        if enabled && !self.auto_mode {
            self.reset();
        }
        self.auto_mode = enabled;
    }

    /// Accumulated integral (error × seconds)
    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn last_output(&self) -> f32 {
        self.last_output
    }

    /// Access the time source
    pub fn clock(&self) -> &C {
        &self.clock
    }
}
