//! PID autotune using the relay feedback method
//!
//! The tuner borrows the heater from the supervisor and drives it as a
//! bang-bang relay around the pre-tune setpoint: full power until the
//! reading reaches `setpoint + amplitude`, off until it falls to
//! `setpoint - amplitude`. Every switch after the first closes a
//! half-period. Once enough full cycles are seen, the mean half-period
//! and the peak-to-peak swing give the ultimate period and gain, and the
//! Ziegler-Nichols rules turn those into PID gains.
//!
//! The tuner is a tick-driven state machine: call [`Autotuner::update`]
//! at the sampling rate. It never blocks, so it can be cancelled between
//! ticks, and it gives up after a configurable timeout.

use core::f32::consts::PI;

use heapless::Vec;

use crate::control::{CommandError, PidTunings, Supervisor};
use crate::traits::{Clock, HeaterOutput, PumpOutput, TemperatureSensor};

/// Half-periods that fit in one session (16 full cycles)
pub const MAX_HALF_PERIODS: usize = 32;

/// Default give-up time (30 minutes)
pub const DEFAULT_TIMEOUT_MS: u32 = 30 * 60 * 1000;

/// Autotune state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AutotuneState {
    /// Not running
    Idle,
    /// Relay running, collecting half-periods
    Running,
    /// Gains computed and applied
    Complete,
    /// Session ended without a result
    Failed(AutotuneError),
}

/// Autotune error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AutotuneError {
    /// Oscillation started but did not complete in time
    Timeout,
    /// The relay never switched, or the swing was zero
    NoOscillation,
    /// Reading went invalid or the fault latch tripped
    SensorFault,
    /// Stopped by the operator or by shutdown
    Cancelled,
    /// A session is already running
    AlreadyRunning,
    /// Amplitude or cycle count out of range
    InvalidConfig,
    /// Supervisor refused to hand over the heater
    Unavailable(CommandError),
}

/// Autotune configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AutotuneConfig {
    /// Relay band either side of the setpoint (°C)
    pub relay_amplitude_c: f32,
    /// Full oscillation cycles to observe
    pub cycles: u8,
    /// Give up after this long (ms)
    pub timeout_ms: u32,
}

impl AutotuneConfig {
    pub fn new(relay_amplitude_c: f32, cycles: u8) -> Self {
        Self {
            relay_amplitude_c,
            cycles,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.relay_amplitude_c.is_finite()
            && self.relay_amplitude_c > 0.0
            && self.cycles > 0
            && self.cycles as usize * 2 <= MAX_HALF_PERIODS
            && self.timeout_ms > 0
    }

    fn half_periods_needed(&self) -> usize {
        self.cycles as usize * 2
    }
}

/// Measured process dynamics and the gains derived from them
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AutotuneResult {
    pub tunings: PidTunings,
    /// Ultimate gain
    pub ku: f32,
    /// Ultimate period (s)
    pub tu_s: f32,
    /// Lowest reading seen while oscillating (°C)
    pub min_c: f32,
    /// Highest reading seen while oscillating (°C)
    pub max_c: f32,
}

/// Classic Ziegler-Nichols PID rule
pub fn ziegler_nichols(ku: f32, tu_s: f32) -> PidTunings {
    PidTunings {
        kp: 0.6 * ku,
        ki: 1.2 * ku / tu_s,
        kd: 0.075 * ku * tu_s,
    }
}

/// Relay autotuner
pub struct Autotuner {
    config: AutotuneConfig,
    state: AutotuneState,
    original_setpoint: f32,
    relay_high: bool,
    started_ms: u64,
    last_switch_ms: Option<u64>,
    half_periods_s: Vec<f32, MAX_HALF_PERIODS>,
    min_c: f32,
    max_c: f32,
    result: Option<AutotuneResult>,
}

impl Default for Autotuner {
    fn default() -> Self {
        Self::new()
    }
}

impl Autotuner {
    pub fn new() -> Self {
        Self {
            config: AutotuneConfig::new(1.0, 1),
            state: AutotuneState::Idle,
            original_setpoint: 0.0,
            relay_high: false,
            started_ms: 0,
            last_switch_ms: None,
            half_periods_s: Vec::new(),
            min_c: f32::INFINITY,
            max_c: f32::NEG_INFINITY,
            result: None,
        }
    }

    /// Begin a session around the supervisor's current setpoint
    ///
    /// The setpoint is moved to `reading + amplitude` for the duration and
    /// restored when the session ends, however it ends.
    pub fn start<S, H, P, C>(
        &mut self,
        sup: &mut Supervisor<S, H, P, C>,
        config: AutotuneConfig,
    ) -> Result<(), AutotuneError>
    where
        S: TemperatureSensor,
        H: HeaterOutput,
        P: PumpOutput,
        C: Clock,
    {
        if self.is_running() {
            return Err(AutotuneError::AlreadyRunning);
        }
        if !config.is_valid() {
            return Err(AutotuneError::InvalidConfig);
        }
        if !sup.reading_valid() {
            return Err(AutotuneError::SensorFault);
        }

        let original = sup.setpoint();
        let ceiling = original + config.relay_amplitude_c;
        sup.begin_relay(ceiling)
            .map_err(AutotuneError::Unavailable)?;

        let temperature = sup.temperature();
        sup.set_target_temperature(temperature + config.relay_amplitude_c);

        self.config = config;
        self.state = AutotuneState::Running;
        self.original_setpoint = original;
        self.started_ms = sup.now_ms();
        self.last_switch_ms = None;
        self.half_periods_s.clear();
        self.min_c = f32::INFINITY;
        self.max_c = f32::NEG_INFINITY;
        self.result = None;

        self.relay_high = temperature < ceiling;
        sup.set_relay(self.relay_high);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Autotune started: setpoint {}C, amplitude {}C, {} cycles",
            original,
            config.relay_amplitude_c,
            config.cycles
        );
        Ok(())
    }

    /// Run one sampling step against the supervisor's latest reading
    pub fn update<S, H, P, C>(&mut self, sup: &mut Supervisor<S, H, P, C>) -> AutotuneState
    where
        S: TemperatureSensor,
        H: HeaterOutput,
        P: PumpOutput,
        C: Clock,
    {
        if !self.is_running() {
            return self.state;
        }

        if sup.is_shut_down() {
            self.fail(sup, AutotuneError::Cancelled);
            return self.state;
        }
        if !sup.reading_valid() || sup.stage().is_fault() {
            self.fail(sup, AutotuneError::SensorFault);
            return self.state;
        }
        // Heater switched off by hand with a good reading
        if !sup.heater_enabled() {
            self.fail(sup, AutotuneError::Cancelled);
            return self.state;
        }

        let now = sup.now_ms();
        if now.saturating_sub(self.started_ms) >= self.config.timeout_ms as u64 {
            let error = if self.last_switch_ms.is_none() {
                AutotuneError::NoOscillation
            } else {
                AutotuneError::Timeout
            };
            self.fail(sup, error);
            return self.state;
        }

        let temperature = sup.temperature();
        let amplitude = self.config.relay_amplitude_c;

        if self.last_switch_ms.is_some() {
            self.track(temperature);
        }

        let switch = if self.relay_high {
            temperature >= self.original_setpoint + amplitude
        } else {
            temperature <= self.original_setpoint - amplitude
        };

        if switch {
            if let Some(last) = self.last_switch_ms {
                let half_period_s = now.saturating_sub(last) as f32 / 1000.0;
                let _ = self.half_periods_s.push(half_period_s);
            } else {
                // Oscillation starts here; the warm-up is not a half-period
                self.track(temperature);
            }
            self.last_switch_ms = Some(now);
            self.relay_high = !self.relay_high;
            sup.set_relay(self.relay_high);
        }

        if self.half_periods_s.len() >= self.config.half_periods_needed() {
            self.finish(sup);
        }

        self.state
    }

    /// Abort a running session
    pub fn cancel<S, H, P, C>(&mut self, sup: &mut Supervisor<S, H, P, C>)
    where
        S: TemperatureSensor,
        H: HeaterOutput,
        P: PumpOutput,
        C: Clock,
    {
        if self.is_running() {
            self.fail(sup, AutotuneError::Cancelled);
        }
    }

    pub fn state(&self) -> AutotuneState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == AutotuneState::Running
    }

    /// Get result (if complete)
    pub fn result(&self) -> Option<&AutotuneResult> {
        self.result.as_ref()
    }

    /// Half-periods collected so far
    pub fn half_period_count(&self) -> usize {
        self.half_periods_s.len()
    }

    fn track(&mut self, temperature: f32) {
        self.min_c = self.min_c.min(temperature);
        self.max_c = self.max_c.max(temperature);
    }

    fn finish<S, H, P, C>(&mut self, sup: &mut Supervisor<S, H, P, C>)
    where
        S: TemperatureSensor,
        H: HeaterOutput,
        P: PumpOutput,
        C: Clock,
    {
        let swing = self.max_c - self.min_c;
        if !(swing > 0.0) {
            self.fail(sup, AutotuneError::NoOscillation);
            return;
        }

        let count = self.half_periods_s.len() as f32;
        let mean_half_period: f32 = self.half_periods_s.iter().sum::<f32>() / count;
        let tu_s = mean_half_period * 2.0;
        let ku = 4.0 * self.config.relay_amplitude_c / (PI * swing);

        if !(tu_s > 0.0) || !ku.is_finite() {
            self.fail(sup, AutotuneError::NoOscillation);
            return;
        }

        let tunings = ziegler_nichols(ku, tu_s);
        sup.set_tunings(tunings);
        self.restore(sup);

        self.result = Some(AutotuneResult {
            tunings,
            ku,
            tu_s,
            min_c: self.min_c,
            max_c: self.max_c,
        });
        self.state = AutotuneState::Complete;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Autotune complete: Ku={} Tu={}s -> Kp={} Ki={} Kd={}",
            ku,
            tu_s,
            tunings.kp,
            tunings.ki,
            tunings.kd
        );
    }

    fn fail<S, H, P, C>(&mut self, sup: &mut Supervisor<S, H, P, C>, error: AutotuneError)
    where
        S: TemperatureSensor,
        H: HeaterOutput,
        P: PumpOutput,
        C: Clock,
    {
        self.restore(sup);
        self.state = AutotuneState::Failed(error);

        #[cfg(feature = "defmt")]
        defmt::warn!("Autotune failed: {:?}", error);
    }

    /// Put the setpoint back and release the heater
    fn restore<S, H, P, C>(&mut self, sup: &mut Supervisor<S, H, P, C>)
    where
        S: TemperatureSensor,
        H: HeaterOutput,
        P: PumpOutput,
        C: Clock,
    {
        sup.set_target_temperature(self.original_setpoint);
        sup.end_relay();
    }
}
