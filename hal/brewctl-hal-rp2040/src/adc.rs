//! Thermistor ADC channel
//!
//! RP2040 has a single 12-bit ADC with 4 external channels:
//! - ADC0: GPIO26
//! - ADC1: GPIO27
//! - ADC2: GPIO28
//! - ADC3: GPIO29
//!
//! The controller samples once per control tick, so blocking one-shot
//! conversions (about 2 µs each) are used instead of the IRQ-driven mode.

use brewctl_hal::{AdcError, AdcReader};
use embassy_rp::adc::{Adc, Blocking, Channel};

/// Full-scale raw value of the 12-bit converter
pub const ADC_FULL_SCALE: u16 = 4095;

/// One ADC channel bound to the shared converter
pub struct RpAdc<'d> {
    adc: Adc<'d, Blocking>,
    channel: Channel<'d>,
}

impl<'d> RpAdc<'d> {
    pub fn new(adc: Adc<'d, Blocking>, channel: Channel<'d>) -> Self {
        Self { adc, channel }
    }
}

impl<'d> AdcReader for RpAdc<'d> {
    fn read(&mut self) -> Result<u16, AdcError> {
        self.adc
            .blocking_read(&mut self.channel)
            .map_err(|_| AdcError::Conversion)
    }

    fn full_scale(&self) -> u16 {
        ADC_FULL_SCALE
    }
}
