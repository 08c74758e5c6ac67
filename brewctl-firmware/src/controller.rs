//! Concrete controller types for this board
//!
//! Embassy tasks cannot be generic, so the supervisor is pinned to the
//! RP2040 drivers here and shared between tasks behind an async mutex.

use embassy_rp::gpio::Output;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Instant;

use brewctl_core::traits::Clock;
use brewctl_core::Supervisor;
use brewctl_drivers::{BetaThermistor, EhOutputPin, GpioPump, PwmHeater};
use brewctl_hal_rp2040::{RpAdc, SsrPwm};

/// Monotonic clock backed by the embassy time driver
#[derive(Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

pub type Sensor = BetaThermistor<RpAdc<'static>>;
pub type Heater = PwmHeater<SsrPwm<'static>>;
pub type Pump = GpioPump<EhOutputPin<Output<'static>>>;

pub type Controller = Supervisor<Sensor, Heater, Pump, EmbassyClock>;

/// Supervisor shared by every task
pub type SharedController = Mutex<CriticalSectionRawMutex, Controller>;
