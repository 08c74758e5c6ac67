//! PWM channel abstraction
//!
//! The heater is driven through an SSR from a PWM channel. Duty is expressed
//! in raw counts so implementations can keep their native resolution.

/// A single PWM output channel
pub trait PwmPin {
    /// Full-scale duty value (100% on)
    fn max_duty(&self) -> u16;

    /// Set the duty cycle in counts, `0..=max_duty()`
    ///
    /// Implementations clamp values above `max_duty()`.
    fn set_duty(&mut self, duty: u16);

    /// Currently programmed duty in counts
    fn duty(&self) -> u16;
}
