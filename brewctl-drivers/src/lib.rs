//! Hardware driver implementations
//!
//! Concrete implementations of the traits defined in brewctl-core:
//!
//! - Temperature sensor (Beta-equation NTC thermistor)
//! - Heater output (PWM into an SSR)
//! - Pump output (GPIO, optionally active-low)
//! - Adapters from `embedded-hal` 1.0 pins to the brewctl-hal traits

#![no_std]
#![deny(unsafe_code)]

pub mod adapters;
pub mod heater;
pub mod pump;
pub mod sensor;

pub use adapters::{EhOutputPin, EhPwm};
pub use heater::PwmHeater;
pub use pump::GpioPump;
pub use sensor::{BetaThermistor, ThermistorConfig};
