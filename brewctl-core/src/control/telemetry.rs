//! Read-only controller snapshot

use brewctl_protocol::{ClockTime, LogRecord};

use crate::state::Stage;

/// Everything a UI or log consumer may show
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telemetry {
    /// Last stored reading (°C), possibly out of range
    pub temperature: f32,
    pub setpoint: f32,
    /// Last commanded heater power (0-100)
    pub heater_output: f32,
    pub pump_on: bool,
    pub heater_enabled: bool,
    pub heating_on: bool,
    pub stage: Stage,
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl Telemetry {
    /// Build the CSV log record for this snapshot
    pub fn to_log_record(&self, uptime_s: u64) -> LogRecord {
        LogRecord {
            time: ClockTime::from_uptime_secs(uptime_s),
            temperature: self.temperature,
            setpoint: self.setpoint,
            heater_output: self.heater_output,
            pump_on: self.pump_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_record_from_snapshot() {
        let telemetry = Telemetry {
            temperature: 64.5,
            setpoint: 65.0,
            heater_output: 37.24,
            pump_on: false,
            heater_enabled: true,
            heating_on: true,
            stage: Stage::Heating,
            kp: 2.0,
            ki: 0.1,
            kd: 0.05,
        };

        let line = telemetry.to_log_record(3_661).to_line().unwrap();
        assert_eq!(line.as_str(), "01:01:01,64.50,65.0,37.2,0");
    }
}
