//! GPIO pump output
//!
//! The circulation pump is switched through a relay or MOSFET on one GPIO.

use brewctl_core::traits::PumpOutput;
use brewctl_hal::OutputPin;

/// GPIO pump output
///
/// The pin can be configured as active-high (default) or active-low.
pub struct GpioPump<P> {
    pin: P,
    /// If true, pump ON = pin LOW
    inverted: bool,
    on: bool,
}

impl<P: OutputPin> GpioPump<P> {
    /// Create a pump output; the pump starts off
    ///
    /// - `inverted`: pump runs while the pin is LOW (active-low relay boards)
    pub fn new(pin: P, inverted: bool) -> Self {
        let mut pump = Self {
            pin,
            inverted,
            on: false,
        };
        pump.set_on(false);
        pump
    }

    pub fn new_active_high(pin: P) -> Self {
        Self::new(pin, false)
    }

    pub fn new_active_low(pin: P) -> Self {
        Self::new(pin, true)
    }
}

impl<P: OutputPin> PumpOutput for GpioPump<P> {
    fn set_on(&mut self, on: bool) {
        self.on = on;
        self.pin.set_state(on != self.inverted);
    }

    fn is_on(&self) -> bool {
        self.on
    }
}
