//! PWM heater output
//!
//! Drives the heating element through an SSR from a PWM channel. Power in
//! percent is mapped linearly onto the channel's duty range.

use brewctl_core::traits::HeaterOutput;
use brewctl_hal::PwmPin;

/// Proportional heater on a PWM channel
pub struct PwmHeater<P> {
    pwm: P,
    power: f32,
}

impl<P: PwmPin> PwmHeater<P> {
    /// Wrap a PWM channel; the heater starts off
    pub fn new(pwm: P) -> Self {
        let mut heater = Self { pwm, power: 0.0 };
        heater.set_power(0.0);
        heater
    }

    /// Duty counts for a power level
    fn duty_for(&self, percent: f32) -> u16 {
        let max = self.pwm.max_duty() as f32;
        libm::roundf(percent / 100.0 * max) as u16
    }

    pub fn pwm(&self) -> &P {
        &self.pwm
    }
}

impl<P: PwmPin> HeaterOutput for PwmHeater<P> {
    fn set_power(&mut self, percent: f32) {
        // NaN lands on 0 through the failed comparisons
        let percent = if percent > 0.0 { percent.min(100.0) } else { 0.0 };
        self.power = percent;
        let duty = self.duty_for(percent);
        self.pwm.set_duty(duty);
    }

    fn power(&self) -> f32 {
        self.power
    }
}
