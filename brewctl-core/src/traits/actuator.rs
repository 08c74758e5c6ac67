//! Actuator traits
//!
//! The controller never initializes hardware; it only commands these
//! outputs. Implementations must leave the output off when constructed.

/// Proportional heater drive
pub trait HeaterOutput {
    /// Drive the heater at `percent` of full power (0-100)
    fn set_power(&mut self, percent: f32);

    /// Currently commanded power (0-100)
    fn power(&self) -> f32;

    /// Turn the heater fully off
    fn off(&mut self) {
        self.set_power(0.0);
    }
}

/// Circulation pump (digital on/off)
pub trait PumpOutput {
    /// Turn the pump on or off
    fn set_on(&mut self, on: bool);

    /// Check if the pump is currently on
    fn is_on(&self) -> bool;
}
