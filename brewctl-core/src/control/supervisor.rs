//! Control supervisor
//!
//! Owns the sensor, the actuators, the PID and every actuation flag. All
//! mutation goes through `&mut self` methods, so callers sharing a
//! supervisor behind a mutex never observe a half-applied change (for
//! example `heater_enabled` cleared while the heater is still driven).
//!
//! Heater power is non-zero only while `heater_enabled`, `heating_on` and
//! a valid reading all hold.

use brewctl_protocol::{ParamUpdate, StageCommand};

use super::mash::{MashProgram, MashProgress, MashRun, MashStep};
use super::pid::{OutputLimits, PidController, PidTunings};
use super::telemetry::Telemetry;
use crate::config::ControllerConfig;
use crate::state::{Event, Stage};
use crate::traits::{Clock, HeaterOutput, PumpOutput, SensorError, TemperatureSensor};

/// Reasons a supervisor command is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Controller has been shut down
    ShutDown,
    /// A fault is latched and not yet acknowledged
    Faulted,
    /// Mash program has no steps
    EmptyProgram,
    /// Autotune or a mash program already holds the heater
    Busy,
    /// Sensor rejected the request
    Sensor(SensorError),
}

/// Follow-up work for the caller after a parameter update
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamEffect {
    /// Fully applied in memory
    Applied,
    /// Offset applied; persist it
    PersistOffset(f32),
    /// Caller should start an autotune session
    AutotuneRequested { relay_amplitude: f32, cycles: u8 },
    /// Outputs are off; caller should stop the system
    Shutdown,
}

/// Control supervisor
pub struct Supervisor<S, H, P, C> {
    sensor: S,
    heater: H,
    pump: P,
    pid: PidController<C>,
    config: ControllerConfig,
    stage: Stage,
    setpoint: f32,
    temperature: f32,
    reading_valid: bool,
    heater_enabled: bool,
    heating_on: bool,
    pump_on: bool,
    heater_output: f32,
    overheat_paused: bool,
    /// Relay ceiling while an autotune drives the heater
    relay_ceiling: Option<f32>,
    mash: Option<MashRun>,
    shut_down: bool,
}

impl<S, H, P, C> Supervisor<S, H, P, C>
where
    S: TemperatureSensor,
    H: HeaterOutput,
    P: PumpOutput,
    C: Clock,
{
    /// Take ownership of the hardware and start in the safe state
    ///
    /// Heater and pump are commanded off and one reading is taken. An
    /// inconsistent `config` is replaced by the defaults.
    pub fn new(sensor: S, heater: H, pump: P, clock: C, config: ControllerConfig) -> Self {
        let config = if config.is_valid() {
            config
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Invalid controller config, using defaults");
            ControllerConfig::default()
        };

        let mut pid = PidController::new(clock, config.tunings, config.output_limits);
        pid.set_setpoint(config.setpoint_c);

        let mut supervisor = Self {
            sensor,
            heater,
            pump,
            pid,
            config,
            stage: Stage::Idle,
            setpoint: config.setpoint_c,
            temperature: f32::NAN,
            reading_valid: false,
            heater_enabled: false,
            heating_on: false,
            pump_on: false,
            heater_output: 0.0,
            overheat_paused: false,
            relay_ceiling: None,
            mash: None,
            shut_down: false,
        };

        supervisor.heater.off();
        supervisor.pump.set_on(false);
        let _ = supervisor.update_temperature();
        supervisor
    }

    // ---- Per-tick operations ----

    /// Take a reading and validate it
    ///
    /// Anything outside the valid range, or a sensor error, immediately
    /// disables heating and drives the heater off. Out-of-range values are
    /// still stored for telemetry.
    pub fn update_temperature(&mut self) -> Result<f32, SensorError> {
        match self.sensor.read_celsius() {
            Ok(temperature) => {
                self.temperature = temperature;
                if self.config.in_valid_range(temperature) {
                    self.reading_valid = true;
                    Ok(temperature)
                } else {
                    self.reading_valid = false;
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Sensor out of range: {}C, disabling heating", temperature);
                    self.force_safe();
                    Err(SensorError::OutOfRange)
                }
            }
            Err(e) => {
                self.temperature = f32::NAN;
                self.reading_valid = false;
                #[cfg(feature = "defmt")]
                defmt::warn!("Sensor read failed: {:?}, disabling heating", e);
                self.force_safe();
                Err(e)
            }
        }
    }

    /// Compute and apply this tick's heater power (0-100)
    ///
    /// Safe to call every tick; the last command wins.
    pub fn get_heater_output(&mut self) -> f32 {
        let power = if self.heater_allowed() {
            match self.relay_ceiling {
                Some(_) => self.pid.output_limits().max.unwrap_or(100.0),
                None => self.pid.compute(self.temperature, None),
            }
        } else {
            0.0
        };

        let power = power.clamp(0.0, 100.0);
        self.command_heater(power);
        power
    }

    /// Advance a running mash program by one reading
    pub fn mash_tick(&mut self) {
        if self.stage != Stage::AutoMash {
            return;
        }

        let now = self.pid.clock().now_ms();
        let reading = self.reading_valid.then_some(self.temperature);
        let tolerance = self.config.mash_tolerance_c;

        let progress = match self.mash.as_mut() {
            Some(run) => run.advance(reading, tolerance, now),
            None => MashProgress::Finished,
        };

        match progress {
            MashProgress::Holding => {}
            MashProgress::NextStep(target) => {
                #[cfg(feature = "defmt")]
                defmt::info!("Mash: next rest at {}C", target);
                self.set_target_temperature(target);
            }
            MashProgress::Finished => {
                #[cfg(feature = "defmt")]
                defmt::info!("Mash program complete");
                self.mash = None;
                self.apply_event(Event::MashFinished);
                self.disarm_heating();
            }
        }
    }

    // ---- Operator commands ----

    /// Change the target on the controller and the PID together
    pub fn set_target_temperature(&mut self, target_c: f32) {
        self.setpoint = target_c;
        self.pid.set_setpoint(target_c);
    }

    /// Flip the heater master enable; returns the new state
    ///
    /// Enabling while a fault is latched counts as acknowledging it.
    /// Nothing can be enabled after shutdown.
    pub fn toggle_heater_enabled(&mut self) -> bool {
        let enable = !self.heater_enabled;
        if enable && self.shut_down {
            return false;
        }
        if enable && self.stage.is_fault() {
            self.apply_event(Event::AcknowledgeFault);
        }
        self.set_heater_enabled(enable);
        enable
    }

    pub fn set_heater_enabled(&mut self, enabled: bool) {
        if enabled && self.shut_down {
            return;
        }
        self.heater_enabled = enabled;
        if !enabled {
            self.heating_on = false;
            self.overheat_paused = false;
            self.command_heater(0.0);
        }
    }

    /// Flip heating on/off; returns the new state
    pub fn toggle_heating(&mut self) -> bool {
        if self.heating_on {
            self.disarm_heating();
        } else {
            self.arm_heating();
        }
        self.heating_on
    }

    /// Flip the pump; returns the new state
    pub fn toggle_pump(&mut self) -> bool {
        self.set_pump(!self.pump_on);
        self.pump_on
    }

    pub fn set_pump(&mut self, on: bool) {
        if on && self.shut_down {
            return;
        }
        self.pump_on = on;
        self.pump.set_on(on);
    }

    pub fn set_tunings(&mut self, tunings: PidTunings) {
        self.pid.set_tunings(tunings);
    }

    /// Change the PID output clamp; the heater stays within 0-100 regardless
    pub fn set_output_limits(&mut self, limits: OutputLimits) {
        self.pid.set_output_limits(limits);
    }

    pub fn output_limits(&self) -> OutputLimits {
        self.pid.output_limits()
    }

    /// Switch the PID between auto and manual (output hold)
    pub fn set_pid_auto_mode(&mut self, auto: bool) {
        self.pid.set_auto_mode(auto);
    }

    pub fn pid_auto_mode(&self) -> bool {
        self.pid.auto_mode()
    }

    /// Apply a new calibration offset to the sensor
    ///
    /// Persisting it is the caller's job (see [`ParamEffect::PersistOffset`]).
    pub fn set_calibration_offset(&mut self, offset_c: f32) -> Result<(), CommandError> {
        self.sensor
            .set_calibration_offset(offset_c)
            .map_err(CommandError::Sensor)
    }

    /// Apply one decoded parameter update
    pub fn apply_param(&mut self, update: ParamUpdate) -> Result<ParamEffect, CommandError> {
        match update {
            ParamUpdate::Kp(kp) => self.set_tunings(PidTunings { kp, ..self.tunings() }),
            ParamUpdate::Ki(ki) => self.set_tunings(PidTunings { ki, ..self.tunings() }),
            ParamUpdate::Kd(kd) => self.set_tunings(PidTunings { kd, ..self.tunings() }),
            ParamUpdate::TogglePump => {
                self.toggle_pump();
            }
            ParamUpdate::ToggleHeater => {
                self.toggle_heater_enabled();
            }
            ParamUpdate::ToggleHeating => {
                self.toggle_heating();
            }
            ParamUpdate::Stage(command) => self.stage_command(command)?,
            ParamUpdate::Mash(rests) => self.start_auto_mash(MashProgram::from_rests(&rests))?,
            ParamUpdate::OutputLimits { min, max } => {
                self.set_output_limits(OutputLimits::new(min, max))
            }
            ParamUpdate::AutoMode(auto) => self.set_pid_auto_mode(auto),
            ParamUpdate::Target(target) => self.set_target_temperature(target),
            ParamUpdate::CalibrationOffset(offset) => {
                self.set_calibration_offset(offset)?;
                return Ok(ParamEffect::PersistOffset(offset));
            }
            ParamUpdate::Autotune {
                relay_amplitude,
                cycles,
            } => {
                return Ok(ParamEffect::AutotuneRequested {
                    relay_amplitude,
                    cycles,
                })
            }
            ParamUpdate::Shutdown => {
                self.shutdown();
                return Ok(ParamEffect::Shutdown);
            }
        }
        Ok(ParamEffect::Applied)
    }

    // ---- Stage control ----

    /// Apply an operator stage command
    pub fn stage_command(&mut self, command: StageCommand) -> Result<(), CommandError> {
        match command {
            StageCommand::Start => self.start_heating(),
            StageCommand::Complete => {
                self.complete();
                Ok(())
            }
            StageCommand::Abort => {
                self.abort();
                Ok(())
            }
            StageCommand::Acknowledge => {
                self.acknowledge_fault();
                Ok(())
            }
        }
    }

    /// Start a manual heating run
    pub fn start_heating(&mut self) -> Result<(), CommandError> {
        self.check_available()?;
        if self.mash.is_some() || self.relay_ceiling.is_some() {
            return Err(CommandError::Busy);
        }
        self.apply_event(Event::StartHeating);
        self.arm_heating();
        Ok(())
    }

    /// Mark the manual run complete
    pub fn complete(&mut self) {
        if self.stage == Stage::Heating {
            self.apply_event(Event::Complete);
            self.disarm_heating();
        }
    }

    /// Stop a manual run or mash program
    pub fn abort(&mut self) {
        if self.stage.is_active() {
            self.mash = None;
            self.apply_event(Event::Abort);
            self.disarm_heating();
        }
    }

    /// Leave the fault stage; the heater stays disabled
    pub fn acknowledge_fault(&mut self) {
        self.apply_event(Event::AcknowledgeFault);
    }

    /// Start a mash step program at its first rest
    pub fn start_auto_mash(&mut self, program: MashProgram) -> Result<(), CommandError> {
        self.check_available()?;
        if self.relay_ceiling.is_some() {
            return Err(CommandError::Busy);
        }

        let run = MashRun::new(program);
        let first = run.current().copied().ok_or(CommandError::EmptyProgram)?;

        self.mash = Some(run);
        self.set_target_temperature(first.target_c);
        self.apply_event(Event::StartMash);
        self.arm_heating();

        #[cfg(feature = "defmt")]
        defmt::info!("Mash program started, first rest at {}C", first.target_c);
        Ok(())
    }

    // ---- Safety hooks ----

    /// Trip the fault latch: heater disabled, stage `Fault`
    pub fn latch_fault(&mut self) {
        self.mash = None;
        self.set_heater_enabled(false);
        self.apply_event(Event::FaultDetected);
    }

    /// Pause heating for overheat; `heater_enabled` stays set
    ///
    /// Only heating that was actually running is marked for resume.
    pub fn pause_for_overheat(&mut self) {
        self.overheat_paused |= self.heating_on;
        self.heating_on = false;
        self.command_heater(0.0);
    }

    /// Re-arm heating after an overheat pause
    pub fn resume_after_overheat(&mut self) {
        if !self.overheat_paused {
            return;
        }
        self.overheat_paused = false;
        if self.heater_enabled && self.relay_ceiling.is_none() {
            self.arm_heating();
        }
    }

    /// Temperature the overheat guard measures against
    ///
    /// During a relay autotune the process is driven above the controller
    /// setpoint on purpose, so the relay ceiling is used when higher.
    pub fn overheat_reference(&self) -> f32 {
        match self.relay_ceiling {
            Some(ceiling) => self.setpoint.max(ceiling),
            None => self.setpoint,
        }
    }

    // ---- Relay mode (autotune) ----

    /// Hand the heater to a relay controller
    ///
    /// Enables the heater and starts with the relay low.
    pub fn begin_relay(&mut self, ceiling_c: f32) -> Result<(), CommandError> {
        self.check_available()?;
        if self.mash.is_some() || self.relay_ceiling.is_some() {
            return Err(CommandError::Busy);
        }
        self.relay_ceiling = Some(ceiling_c);
        self.overheat_paused = false;
        self.heater_enabled = true;
        self.heating_on = false;
        self.command_heater(0.0);
        Ok(())
    }

    /// Drive the relay high (full power) or low (off)
    pub fn set_relay(&mut self, high: bool) {
        if self.relay_ceiling.is_none() {
            return;
        }
        self.heating_on = high && self.heater_enabled && !self.shut_down;
        if !self.heating_on {
            self.command_heater(0.0);
        }
    }

    /// Leave relay mode: heater disabled, PID state cleared
    pub fn end_relay(&mut self) {
        if self.relay_ceiling.take().is_none() {
            return;
        }
        self.set_heater_enabled(false);
        self.pid.reset();
    }

    pub fn relay_active(&self) -> bool {
        self.relay_ceiling.is_some()
    }

    // ---- Shutdown ----

    /// Force every output off and refuse to re-enable them
    pub fn shutdown(&mut self) {
        self.shut_down = true;
        self.relay_ceiling = None;
        self.mash = None;
        self.set_heater_enabled(false);
        self.set_pump(false);
        if self.stage.is_active() {
            self.apply_event(Event::Abort);
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Controller shut down, outputs off");
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    // ---- Snapshot and accessors ----

    pub fn snapshot(&self) -> Telemetry {
        let tunings = self.tunings();
        Telemetry {
            temperature: self.temperature,
            setpoint: self.setpoint,
            heater_output: self.heater_output,
            pump_on: self.pump_on,
            heater_enabled: self.heater_enabled,
            heating_on: self.heating_on,
            stage: self.stage,
            kp: tunings.kp,
            ki: tunings.ki,
            kd: tunings.kd,
        }
    }

    /// Last stored reading, possibly out of range (NaN after a read error)
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Whether the last reading was inside the valid range
    pub fn reading_valid(&self) -> bool {
        self.reading_valid
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    pub fn heater_enabled(&self) -> bool {
        self.heater_enabled
    }

    pub fn heating_on(&self) -> bool {
        self.heating_on
    }

    pub fn pump_on(&self) -> bool {
        self.pump_on
    }

    /// Last commanded heater power
    pub fn heater_output(&self) -> f32 {
        self.heater_output
    }

    pub fn overheat_paused(&self) -> bool {
        self.overheat_paused
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn tunings(&self) -> PidTunings {
        self.pid.tunings()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Current mash rest (index, step), if a program is running
    pub fn mash_step(&self) -> Option<(usize, MashStep)> {
        self.mash
            .as_ref()
            .and_then(|run| run.current().map(|step| (run.index(), *step)))
    }

    pub fn now_ms(&self) -> u64 {
        self.pid.clock().now_ms()
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn heater(&self) -> &H {
        &self.heater
    }

    pub fn pump(&self) -> &P {
        &self.pump
    }

    // ---- Internals ----

    fn heater_allowed(&self) -> bool {
        self.heater_enabled && self.heating_on && self.reading_valid && !self.shut_down
    }

    fn check_available(&self) -> Result<(), CommandError> {
        if self.shut_down {
            Err(CommandError::ShutDown)
        } else if self.stage.is_fault() {
            Err(CommandError::Faulted)
        } else {
            Ok(())
        }
    }

    fn apply_event(&mut self, event: Event) {
        let next = self.stage.transition(event);
        if next != self.stage {
            #[cfg(feature = "defmt")]
            defmt::info!("Stage {} -> {}", self.stage.as_str(), next.as_str());
            self.stage = next;
        }
    }

    /// Turn heating on, starting the PID from a clean state
    fn arm_heating(&mut self) {
        if self.shut_down || self.heating_on {
            return;
        }
        self.pid.reset();
        self.heating_on = true;
    }

    fn disarm_heating(&mut self) {
        self.heating_on = false;
        self.overheat_paused = false;
        self.command_heater(0.0);
    }

    fn force_safe(&mut self) {
        self.heating_on = false;
        self.heater_enabled = false;
        self.overheat_paused = false;
        self.command_heater(0.0);
    }

    fn command_heater(&mut self, power: f32) {
        self.heater_output = power;
        self.heater.set_power(power);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedSensor, MockClock, MockHeater, MockPump, MockSensor};
    use brewctl_protocol::Params;

    type TestSupervisor<'a> = Supervisor<MockSensor, MockHeater, MockPump, &'a MockClock>;

    fn supervisor(clock: &MockClock, temperature: f32) -> TestSupervisor<'_> {
        Supervisor::new(
            MockSensor::new(temperature),
            MockHeater::default(),
            MockPump::default(),
            clock,
            ControllerConfig::default(),
        )
    }

    fn approx(a: f32, b: f32) -> bool {
        libm::fabsf(a - b) < 1e-4
    }

    fn heating(sup: &mut TestSupervisor<'_>) {
        sup.set_heater_enabled(true);
        sup.start_heating().unwrap();
    }

    /// Feed a serial line through the parameter decoder
    fn send(sup: &mut TestSupervisor<'_>, line: &str) -> Result<(), CommandError> {
        for update in Params::new(line) {
            sup.apply_param(update.unwrap())?;
        }
        Ok(())
    }

    /// One control tick: read, then drive the heater
    fn tick(sup: &mut TestSupervisor<'_>, clock: &MockClock) -> f32 {
        clock.advance(100);
        let _ = sup.update_temperature();
        sup.mash_tick();
        sup.get_heater_output()
    }

    #[test]
    fn test_starts_safe() {
        let clock = MockClock::new(0);
        let sup = supervisor(&clock, 21.5);

        assert_eq!(sup.stage(), Stage::Idle);
        assert!(!sup.heater_enabled());
        assert!(!sup.heating_on());
        assert!(!sup.pump_on());
        assert_eq!(sup.heater().power, 0.0);
        assert_eq!(sup.temperature(), 21.5);
        assert!(sup.reading_valid());
        assert_eq!(sup.setpoint(), 65.0);
    }

    #[test]
    fn test_heater_output_follows_pid() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);
        heating(&mut sup);

        let power = sup.get_heater_output();
        assert!(approx(power, 10.05));
        assert!(approx(sup.heater().power, 10.05));
        assert!(approx(sup.snapshot().heater_output, 10.05));
    }

    #[test]
    fn test_disabled_heater_always_zero() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 20.0);
        sup.start_heating().unwrap();

        for t in [0.0, 20.0, 64.9, 99.9, 100.0] {
            sup.sensor_mut().set(t);
            let _ = sup.update_temperature();
            assert_eq!(sup.get_heater_output(), 0.0);
            assert_eq!(sup.heater().power, 0.0);
        }
    }

    #[test]
    fn test_out_of_range_forces_safe_and_keeps_reading() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);
        heating(&mut sup);
        sup.get_heater_output();
        assert!(sup.heater().power > 0.0);

        sup.sensor_mut().set(104.2);
        assert_eq!(sup.update_temperature(), Err(SensorError::OutOfRange));

        assert!(!sup.heater_enabled());
        assert!(!sup.heating_on());
        assert_eq!(sup.heater().power, 0.0);
        assert_eq!(sup.temperature(), 104.2);
        assert!(!sup.reading_valid());
    }

    #[test]
    fn test_sensor_error_forces_safe() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);
        heating(&mut sup);

        sup.sensor_mut().raw = Err(SensorError::OpenCircuit);
        assert_eq!(sup.update_temperature(), Err(SensorError::OpenCircuit));
        assert!(!sup.heater_enabled());
        assert!(sup.temperature().is_nan());
        assert_eq!(sup.get_heater_output(), 0.0);
    }

    #[test]
    fn test_set_target_updates_pid() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);
        heating(&mut sup);

        sup.set_target_temperature(70.0);
        assert_eq!(sup.setpoint(), 70.0);

        // error = 10 -> 2.0*10 + 0.1*(10*0.1)
        assert!(approx(sup.get_heater_output(), 20.1));
    }

    #[test]
    fn test_disabling_heater_clears_heating() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);
        heating(&mut sup);
        sup.get_heater_output();

        assert!(!sup.toggle_heater_enabled());
        assert!(!sup.heating_on());
        assert_eq!(sup.heater().power, 0.0);
    }

    #[test]
    fn test_toggle_heating_off_zeroes_heater() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);
        heating(&mut sup);
        sup.get_heater_output();

        assert!(!sup.toggle_heating());
        assert!(sup.heater_enabled());
        assert_eq!(sup.heater().power, 0.0);
        assert!(sup.toggle_heating());
    }

    #[test]
    fn test_toggle_pump() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);

        assert!(sup.toggle_pump());
        assert!(sup.pump().on);
        assert!(!sup.toggle_pump());
        assert!(!sup.pump().on);
    }

    #[test]
    fn test_enabling_heater_acknowledges_fault() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);
        heating(&mut sup);

        sup.latch_fault();
        assert_eq!(sup.stage(), Stage::Fault);
        assert_eq!(sup.start_heating(), Err(CommandError::Faulted));

        assert!(sup.toggle_heater_enabled());
        assert_eq!(sup.stage(), Stage::Idle);
        assert!(!sup.heating_on());
    }

    #[test]
    fn test_acknowledge_keeps_heater_disabled() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);
        heating(&mut sup);

        sup.latch_fault();
        sup.acknowledge_fault();
        assert_eq!(sup.stage(), Stage::Idle);
        assert!(!sup.heater_enabled());
    }

    #[test]
    fn test_apply_params() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);

        assert_eq!(sup.apply_param(ParamUpdate::Kp(4.0)), Ok(ParamEffect::Applied));
        assert_eq!(sup.apply_param(ParamUpdate::Kd(0.5)), Ok(ParamEffect::Applied));
        assert_eq!(sup.tunings(), PidTunings::new(4.0, 0.1, 0.5));

        sup.apply_param(ParamUpdate::TogglePump).unwrap();
        assert!(sup.pump_on());
        sup.apply_param(ParamUpdate::ToggleHeater).unwrap();
        assert!(sup.heater_enabled());

        sup.apply_param(ParamUpdate::Target(67.5)).unwrap();
        assert_eq!(sup.setpoint(), 67.5);

        assert_eq!(
            sup.apply_param(ParamUpdate::CalibrationOffset(-0.5)),
            Ok(ParamEffect::PersistOffset(-0.5))
        );
        assert_eq!(sup.update_temperature(), Ok(59.5));

        assert_eq!(
            sup.apply_param(ParamUpdate::Autotune {
                relay_amplitude: 2.0,
                cycles: 3
            }),
            Ok(ParamEffect::AutotuneRequested {
                relay_amplitude: 2.0,
                cycles: 3
            })
        );
    }

    #[test]
    fn test_offset_rejected_without_calibration_support() {
        let clock = MockClock::new(0);
        let mut sup = Supervisor::new(
            FixedSensor(50.0),
            MockHeater::default(),
            MockPump::default(),
            &clock,
            ControllerConfig::default(),
        );

        assert_eq!(
            sup.apply_param(ParamUpdate::CalibrationOffset(1.0)),
            Err(CommandError::Sensor(SensorError::CalibrationUnsupported))
        );
    }

    #[test]
    fn test_manual_stage_flow() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);

        heating(&mut sup);
        assert_eq!(sup.stage(), Stage::Heating);
        assert!(sup.heating_on());

        sup.complete();
        assert_eq!(sup.stage(), Stage::Completed);
        assert!(!sup.heating_on());
        assert_eq!(sup.heater().power, 0.0);
    }

    #[test]
    fn test_auto_mash_program() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 50.0);
        sup.set_heater_enabled(true);

        let program =
            MashProgram::from_steps(&[MashStep::new(63.0, 10), MashStep::new(72.0, 5)]).unwrap();
        sup.start_auto_mash(program).unwrap();
        assert_eq!(sup.stage(), Stage::AutoMash);
        assert_eq!(sup.setpoint(), 63.0);

        // Reach the first rest and hold it
        sup.sensor_mut().set(62.5);
        sup.update_temperature().unwrap();
        sup.mash_tick();
        clock.advance(10_000);
        sup.mash_tick();
        assert_eq!(sup.setpoint(), 72.0);
        assert_eq!(sup.mash_step(), Some((1, MashStep::new(72.0, 5))));

        // Second rest
        sup.sensor_mut().set(71.2);
        sup.update_temperature().unwrap();
        sup.mash_tick();
        clock.advance(5_000);
        sup.mash_tick();

        assert_eq!(sup.stage(), Stage::Completed);
        assert!(!sup.heating_on());
        assert_eq!(sup.mash_step(), None);
        assert_eq!(sup.get_heater_output(), 0.0);
    }

    #[test]
    fn test_empty_mash_program_rejected() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 50.0);
        assert_eq!(
            sup.start_auto_mash(MashProgram::new()),
            Err(CommandError::EmptyProgram)
        );
        assert_eq!(sup.stage(), Stage::Idle);
    }

    #[test]
    fn test_relay_mode_drives_full_power() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);

        sup.begin_relay(67.0).unwrap();
        assert!(sup.heater_enabled());
        assert_eq!(sup.get_heater_output(), 0.0);

        sup.set_relay(true);
        assert_eq!(sup.get_heater_output(), 100.0);
        assert_eq!(sup.overheat_reference(), 67.0);

        sup.set_relay(false);
        assert_eq!(sup.get_heater_output(), 0.0);

        sup.end_relay();
        assert!(!sup.relay_active());
        assert!(!sup.heater_enabled());
        assert_eq!(sup.overheat_reference(), 65.0);
    }

    #[test]
    fn test_shutdown_latches_outputs_off() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);
        heating(&mut sup);
        sup.toggle_pump();
        sup.get_heater_output();

        assert_eq!(sup.apply_param(ParamUpdate::Shutdown), Ok(ParamEffect::Shutdown));
        assert!(sup.is_shut_down());
        assert_eq!(sup.heater().power, 0.0);
        assert!(!sup.pump().on);
        assert_eq!(sup.stage(), Stage::Idle);

        assert!(!sup.toggle_heater_enabled());
        assert!(!sup.toggle_pump());
        assert!(!sup.toggle_heating());
        assert_eq!(sup.start_heating(), Err(CommandError::ShutDown));
        assert_eq!(sup.get_heater_output(), 0.0);
    }

    #[test]
    fn test_serial_commands_drive_heater() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 40.0);

        send(&mut sup, "heater=toggle&target=70&stage=start").unwrap();
        assert_eq!(sup.stage(), Stage::Heating);
        assert!(sup.heating_on());

        for _ in 0..50 {
            assert!(tick(&mut sup, &clock) > 0.0);
        }
        assert!(sup.heater().power > 0.0);
    }

    #[test]
    fn test_heating_toggle_over_serial() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 40.0);

        send(&mut sup, "heater=toggle&target=70&heating=toggle").unwrap();
        assert!(sup.heating_on());
        assert!(tick(&mut sup, &clock) > 0.0);

        send(&mut sup, "heating=toggle").unwrap();
        assert!(!sup.heating_on());
        assert!(sup.heater_enabled());
        assert_eq!(tick(&mut sup, &clock), 0.0);
    }

    #[test]
    fn test_stage_commands_over_serial() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);

        send(&mut sup, "heater=toggle&stage=start").unwrap();
        assert_eq!(sup.stage(), Stage::Heating);

        send(&mut sup, "stage=complete").unwrap();
        assert_eq!(sup.stage(), Stage::Completed);
        assert!(!sup.heating_on());

        send(&mut sup, "stage=start").unwrap();
        assert_eq!(sup.stage(), Stage::Heating);
        send(&mut sup, "stage=abort").unwrap();
        assert_eq!(sup.stage(), Stage::Idle);
        assert_eq!(sup.heater().power, 0.0);

        sup.latch_fault();
        assert_eq!(send(&mut sup, "stage=start"), Err(CommandError::Faulted));
        send(&mut sup, "stage=ack").unwrap();
        assert_eq!(sup.stage(), Stage::Idle);
        assert!(!sup.heater_enabled());
    }

    #[test]
    fn test_mash_program_over_serial() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 50.0);

        send(&mut sup, "heater=toggle&mash=63:10,72:5").unwrap();
        assert_eq!(sup.stage(), Stage::AutoMash);
        assert_eq!(sup.setpoint(), 63.0);
        assert_eq!(sup.mash_step(), Some((0, MashStep::new(63.0, 10))));
        assert!(tick(&mut sup, &clock) > 0.0);

        // A manual run cannot start over a running program
        assert_eq!(
            sup.apply_param(ParamUpdate::Stage(StageCommand::Start)),
            Err(CommandError::Busy)
        );
    }

    #[test]
    fn test_output_limits_and_mode_over_serial() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 40.0);

        send(&mut sup, "limits=0,40&heater=toggle&target=70&heating=toggle").unwrap();
        assert_eq!(sup.output_limits(), OutputLimits::new(0.0, 40.0));
        assert!(approx(tick(&mut sup, &clock), 40.0));

        send(&mut sup, "mode=manual").unwrap();
        assert!(!sup.pid_auto_mode());
        sup.sensor_mut().set(69.0);
        assert!(approx(tick(&mut sup, &clock), 40.0));

        send(&mut sup, "mode=auto&limits=0,100").unwrap();
        assert!(sup.pid_auto_mode());
        let power = tick(&mut sup, &clock);
        assert!(power > 0.0 && power < 40.0);
    }

    #[test]
    fn test_relay_uses_current_output_limit() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);
        sup.set_output_limits(OutputLimits::new(0.0, 80.0));

        sup.begin_relay(67.0).unwrap();
        sup.set_relay(true);
        assert_eq!(sup.get_heater_output(), 80.0);
    }

    #[test]
    fn test_heating_recovers_after_out_of_range_reading() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 60.0);
        heating(&mut sup);
        assert!(tick(&mut sup, &clock) > 0.0);

        sup.sensor_mut().set(101.0);
        assert_eq!(tick(&mut sup, &clock), 0.0);
        assert_eq!(sup.stage(), Stage::Heating);
        assert!(!sup.heater_enabled());

        // A good reading alone does not restart the heater
        sup.sensor_mut().set(60.0);
        assert_eq!(tick(&mut sup, &clock), 0.0);

        send(&mut sup, "heater=toggle&heating=toggle").unwrap();
        assert_eq!(sup.stage(), Stage::Heating);
        assert!(tick(&mut sup, &clock) > 0.0);
    }

    #[test]
    fn test_mash_recovers_after_out_of_range_reading() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 50.0);
        send(&mut sup, "heater=toggle&mash=63:10,72:5").unwrap();
        assert!(tick(&mut sup, &clock) > 0.0);

        sup.sensor_mut().set(-3.0);
        assert_eq!(tick(&mut sup, &clock), 0.0);
        assert_eq!(sup.stage(), Stage::AutoMash);
        assert_eq!(sup.mash_step(), Some((0, MashStep::new(63.0, 10))));

        sup.sensor_mut().set(55.0);
        assert_eq!(tick(&mut sup, &clock), 0.0);
        send(&mut sup, "heater=toggle&heating=toggle").unwrap();
        assert!(tick(&mut sup, &clock) > 0.0);
        assert_eq!(sup.setpoint(), 63.0);
        assert_eq!(sup.mash_step(), Some((0, MashStep::new(63.0, 10))));
    }

    #[test]
    fn test_abort_after_out_of_range_reading() {
        let clock = MockClock::new(0);
        let mut sup = supervisor(&clock, 50.0);
        send(&mut sup, "heater=toggle&mash=63:10").unwrap();

        sup.sensor_mut().set(101.0);
        tick(&mut sup, &clock);
        send(&mut sup, "stage=abort").unwrap();

        assert_eq!(sup.stage(), Stage::Idle);
        assert_eq!(sup.mash_step(), None);
        assert!(!sup.heating_on());
        assert_eq!(sup.heater().power, 0.0);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let clock = MockClock::new(0);
        let config = ControllerConfig {
            overheat_hysteresis_c: 6.0,
            ..ControllerConfig::default()
        };
        let sup = Supervisor::new(
            MockSensor::new(20.0),
            MockHeater::default(),
            MockPump::default(),
            &clock,
            config,
        );
        assert_eq!(sup.config(), &ControllerConfig::default());
    }
}
