//! Heater output drivers

pub mod pwm;

pub use pwm::PwmHeater;
