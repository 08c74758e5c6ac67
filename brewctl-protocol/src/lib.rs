//! brewctl text protocols
//!
//! Two small text formats cross the controller boundary:
//!
//! - **Parameter updates** arrive as `key=value` pairs joined by `&`
//!   (the query-string format of the tuning page):
//!   ```text
//!   p=2.0&i=0.1&d=0.05&pump=toggle&heater=toggle&stage=start
//!   ```
//! - **Log records** leave as one CSV line per telemetry interval:
//!   ```text
//!   HH:MM:SS,temperature,setpoint,heater_output,pump_on
//!   ```
//!
//! Both are allocation-free and bounded by `heapless` capacities.

#![no_std]
#![deny(unsafe_code)]

pub mod log;
pub mod params;

pub use log::{ClockTime, LogRecord, LOG_LINE_CAPACITY};
pub use params::{
    parse_pair, MashRest, ParamError, ParamUpdate, Params, StageCommand, MAX_MASH_RESTS,
};
