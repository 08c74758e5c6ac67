//! Heater SSR PWM
//!
//! Zero-cross SSRs only switch at mains zero crossings, so the heater is
//! driven with the slowest period the PWM slice supports cleanly:
//!
//! ```text
//! 125 MHz / 250 (divider) / 50_000 (top) = 10 Hz
//! ```

use brewctl_hal::PwmPin;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use fixed::types::U12F4;

/// Counter wrap value (duty resolution)
pub const SSR_PWM_TOP: u16 = 49_999;

/// System clock divider
pub const SSR_PWM_DIVIDER: u8 = 250;

/// Heater drive on output A of a PWM slice
pub struct SsrPwm<'d> {
    pwm: Pwm<'d>,
    config: PwmConfig,
}

impl<'d> SsrPwm<'d> {
    /// Configure the slice for SSR drive, starting at 0% duty
    pub fn new(mut pwm: Pwm<'d>) -> Self {
        let mut config = PwmConfig::default();
        config.top = SSR_PWM_TOP;
        config.divider = U12F4::from_num(SSR_PWM_DIVIDER);
        config.compare_a = 0;
        pwm.set_config(&config);

        Self { pwm, config }
    }
}

impl<'d> PwmPin for SsrPwm<'d> {
    fn max_duty(&self) -> u16 {
        // Compare == top + 1 keeps the output high for the whole period
        self.config.top + 1
    }

    fn set_duty(&mut self, duty: u16) {
        let duty = duty.min(self.max_duty());
        if duty != self.config.compare_a {
            self.config.compare_a = duty;
            self.pwm.set_config(&self.config);
        }
    }

    fn duty(&self) -> u16 {
        self.config.compare_a
    }
}
