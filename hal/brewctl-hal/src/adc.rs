//! Analog input abstraction

/// Errors from an ADC conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcError {
    /// Conversion did not complete
    Conversion,
    /// Channel is not configured
    Channel,
}

/// Single-channel ADC reader
pub trait AdcReader {
    /// Read a raw conversion result
    fn read(&mut self) -> Result<u16, AdcError>;

    /// Full-scale raw value (4095 for a 12-bit converter)
    fn full_scale(&self) -> u16 {
        4095
    }
}
