//! Digital output abstraction
//!
//! Used for on/off loads such as the pump relay. Whether "on" means a high
//! or low level is decided by the driver, not the pin.

/// Push-pull output that remembers the level it last drove
pub trait OutputPin {
    /// Drive logic 1
    fn set_high(&mut self);

    /// Drive logic 0
    fn set_low(&mut self);

    /// Drive `high` as a level
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Last driven level
    fn is_set_high(&self) -> bool;
}
