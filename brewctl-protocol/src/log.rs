//! CSV log records
//!
//! One record is emitted per telemetry interval:
//!
//! ```text
//! 00:01:00,64.87,65.0,12.4,1
//! ```
//!
//! Fields: wall-clock time, temperature (°C, 2 decimals), setpoint
//! (°C, 1 decimal), heater output (%, 1 decimal), pump state (`1`/`0`).

use core::fmt;

use heapless::String;

/// Capacity of a formatted log line
pub const LOG_LINE_CAPACITY: usize = 64;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Time of day, formatted as `HH:MM:SS`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockTime {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl ClockTime {
    /// Derive a time of day from seconds since boot
    ///
    /// The controller has no RTC, so uptime stands in for the clock and
    /// wraps every 24 hours.
    pub fn from_uptime_secs(uptime_s: u64) -> Self {
        let secs = uptime_s % SECONDS_PER_DAY;
        Self {
            hours: (secs / 3600) as u8,
            minutes: ((secs % 3600) / 60) as u8,
            seconds: (secs % 60) as u8,
        }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// A single telemetry log record
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LogRecord {
    pub time: ClockTime,
    pub temperature: f32,
    pub setpoint: f32,
    pub heater_output: f32,
    pub pump_on: bool,
}

impl LogRecord {
    /// Render the record as a CSV line (no trailing newline)
    pub fn to_line(&self) -> Result<String<LOG_LINE_CAPACITY>, fmt::Error> {
        let mut line = String::new();
        fmt::write(&mut line, format_args!("{}", self))?;
        Ok(line)
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{:.2},{:.1},{:.1},{}",
            self.time,
            self.temperature,
            self.setpoint,
            self.heater_output,
            if self.pump_on { 1 } else { 0 }
        )
    }
}
