//! Temperature sensor trait

/// Errors that can occur with temperature sensing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Sensor disconnected (open circuit)
    OpenCircuit,
    /// Sensor shorted to ground
    ShortCircuit,
    /// Reading out of expected range
    OutOfRange,
    /// ADC conversion error
    ConversionError,
    /// Sensor has no calibration support
    CalibrationUnsupported,
}

/// Trait for temperature sensors
///
/// Implementations handle the specific sensor type and return calibrated
/// degrees Celsius. Calibration is an optional capability: sensors that
/// support it override [`supports_calibration`](Self::supports_calibration)
/// and the offset accessors, everything else inherits the null defaults.
pub trait TemperatureSensor {
    /// Read the current calibrated temperature in degrees Celsius
    ///
    /// Takes `&mut self` because ADC reads typically require mutable access.
    fn read_celsius(&mut self) -> Result<f32, SensorError>;

    /// Whether the calibration offset can be changed
    fn supports_calibration(&self) -> bool {
        false
    }

    /// Offset (°C) currently added to every conversion
    fn calibration_offset(&self) -> f32 {
        0.0
    }

    /// Replace the calibration offset
    fn set_calibration_offset(&mut self, _offset_c: f32) -> Result<(), SensorError> {
        Err(SensorError::CalibrationUnsupported)
    }
}
