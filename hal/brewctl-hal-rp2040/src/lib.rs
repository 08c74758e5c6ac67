//! RP2040-specific HAL for the brewing controller
//!
//! Implements the shared `brewctl-hal` traits on top of `embassy-rp`:
//!
//! - Thermistor ADC channel (blocking one-shot conversions)
//! - Slow hardware PWM for the heater SSR
//! - Flash storage driver (implements `brewctl_hal::FlashStorage`)
//!
//! The pump relay needs nothing chip-specific: `embassy_rp::gpio::Output`
//! implements `embedded-hal` and is wrapped by `brewctl_drivers::EhOutputPin`.

#![no_std]

pub mod adc;
pub mod flash;
pub mod pwm;

pub use adc::RpAdc;
pub use flash::Rp2040FlashStorage;
pub use pwm::SsrPwm;

// Re-export shared traits from brewctl-hal for convenience
pub use brewctl_hal::{FlashStorage as FlashStorageTrait, StorageKey};
