//! `embedded-hal` 1.0 adapters
//!
//! Any chip HAL implementing the `embedded-hal` digital and PWM traits can
//! back the brewctl-hal traits through these wrappers. On-chip GPIO and
//! PWM writes are infallible in practice, so driver errors are dropped and
//! the last requested state is tracked here.

use brewctl_hal::{OutputPin, PwmPin};
use embedded_hal::digital::OutputPin as EhDigitalOutput;
use embedded_hal::pwm::SetDutyCycle;

/// Digital output backed by an `embedded-hal` pin
pub struct EhOutputPin<P> {
    pin: P,
    high: bool,
}

impl<P: EhDigitalOutput> EhOutputPin<P> {
    /// Wrap a pin, driving it low
    pub fn new(pin: P) -> Self {
        let mut wrapped = Self { pin, high: false };
        OutputPin::set_low(&mut wrapped);
        wrapped
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: EhDigitalOutput> OutputPin for EhOutputPin<P> {
    fn set_high(&mut self) {
        let _ = self.pin.set_high();
        self.high = true;
    }

    fn set_low(&mut self) {
        let _ = self.pin.set_low();
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// PWM channel backed by an `embedded-hal` duty-cycle output
pub struct EhPwm<P> {
    pwm: P,
    duty: u16,
}

impl<P: SetDutyCycle> EhPwm<P> {
    /// Wrap a channel, starting at 0% duty
    pub fn new(pwm: P) -> Self {
        let mut wrapped = Self { pwm, duty: 0 };
        wrapped.set_duty(0);
        wrapped
    }
}

impl<P: SetDutyCycle> PwmPin for EhPwm<P> {
    fn max_duty(&self) -> u16 {
        self.pwm.max_duty_cycle()
    }

    fn set_duty(&mut self, duty: u16) {
        let duty = duty.min(self.max_duty());
        let _ = self.pwm.set_duty_cycle(duty);
        self.duty = duty;
    }

    fn duty(&self) -> u16 {
        self.duty
    }
}
