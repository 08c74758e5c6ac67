//! NTC thermistor using the Beta equation
//!
//! Circuit: VREF -- NTC -- ADC pin -- series resistor -- GND
//!
//! ```text
//! V     = raw / full_scale * VREF
//! R_ntc = R_series * (VREF / V - 1)
//! 1/T   = 1/T0 + ln(R_ntc / R0) / B
//! ```
//!
//! The calibration offset is added to every conversion.

use brewctl_core::traits::{SensorError, TemperatureSensor};
use brewctl_hal::AdcReader;

const KELVIN_OFFSET: f32 = 273.15;

/// Electrical parameters of the thermistor divider
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ThermistorConfig {
    /// Series (pull-up) resistor (Ω)
    pub series_ohms: f32,
    /// Thermistor resistance at the nominal temperature (Ω)
    pub nominal_ohms: f32,
    /// Nominal temperature (°C)
    pub nominal_c: f32,
    /// Beta coefficient (K)
    pub beta: f32,
    /// ADC reference voltage (V)
    pub vref: f32,
}

impl Default for ThermistorConfig {
    /// 10 kΩ / B3950 NTC behind a 10 kΩ resistor on a 3.3 V rail
    fn default() -> Self {
        Self {
            series_ohms: 10_000.0,
            nominal_ohms: 10_000.0,
            nominal_c: 25.0,
            beta: 3950.0,
            vref: 3.3,
        }
    }
}

/// Beta-equation NTC sensor with a calibration offset
pub struct BetaThermistor<A> {
    adc: A,
    config: ThermistorConfig,
    offset_c: f32,
}

impl<A: AdcReader> BetaThermistor<A> {
    /// Create a sensor with the offset loaded from storage
    pub fn new(adc: A, config: ThermistorConfig, offset_c: f32) -> Self {
        Self {
            adc,
            config,
            offset_c,
        }
    }

    /// Uncalibrated temperature for a raw conversion
    pub fn raw_to_celsius(&self, raw: u16) -> Result<f32, SensorError> {
        let full_scale = self.adc.full_scale();
        if raw == 0 {
            // Nothing reaches the pin through the NTC
            return Err(SensorError::OpenCircuit);
        }
        if raw >= full_scale {
            return Err(SensorError::ShortCircuit);
        }

        let cfg = &self.config;
        let voltage = raw as f32 / full_scale as f32 * cfg.vref;
        let resistance = cfg.series_ohms * (cfg.vref / voltage - 1.0);

        let ln_r = libm::logf(resistance / cfg.nominal_ohms);
        let kelvin = 1.0 / (ln_r / cfg.beta + 1.0 / (cfg.nominal_c + KELVIN_OFFSET));
        let celsius = kelvin - KELVIN_OFFSET;

        if celsius.is_finite() {
            Ok(celsius)
        } else {
            Err(SensorError::ConversionError)
        }
    }

    pub fn config(&self) -> &ThermistorConfig {
        &self.config
    }
}

impl<A: AdcReader> TemperatureSensor for BetaThermistor<A> {
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        let raw = self.adc.read().map_err(|_| SensorError::ConversionError)?;
        Ok(self.raw_to_celsius(raw)? + self.offset_c)
    }

    fn supports_calibration(&self) -> bool {
        true
    }

    fn calibration_offset(&self) -> f32 {
        self.offset_c
    }

    fn set_calibration_offset(&mut self, offset_c: f32) -> Result<(), SensorError> {
        if !offset_c.is_finite() {
            return Err(SensorError::OutOfRange);
        }
        self.offset_c = offset_c;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewctl_core::config::{load_offset, save_offset};
    use brewctl_hal::{AdcError, FlashError, FlashStorage, StorageKey};
    use embassy_futures::block_on;

    struct DummyAdc(Result<u16, AdcError>);

    impl AdcReader for DummyAdc {
        fn read(&mut self) -> Result<u16, AdcError> {
            self.0
        }
    }

    /// Single-slot flash holding only the offset record
    #[derive(Default)]
    struct OffsetFlash {
        data: Option<heapless::Vec<u8, 32>>,
    }

    impl FlashStorage for OffsetFlash {
        async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
            match (key, &self.data) {
                (StorageKey::SensorOffset, Some(data)) => {
                    buffer[..data.len()].copy_from_slice(data);
                    Ok(data.len())
                }
                _ => Err(FlashError::NotFound),
            }
        }

        async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
            if key != StorageKey::SensorOffset {
                return Err(FlashError::Storage);
            }
            self.data = Some(heapless::Vec::from_slice(data).map_err(|_| FlashError::Full)?);
            Ok(())
        }

        async fn exists(&mut self, key: StorageKey) -> bool {
            key == StorageKey::SensorOffset && self.data.is_some()
        }
    }

    fn sensor(raw: u16, offset: f32) -> BetaThermistor<DummyAdc> {
        BetaThermistor::new(DummyAdc(Ok(raw)), ThermistorConfig::default(), offset)
    }

    fn approx(a: f32, b: f32, tol: f32) -> bool {
        libm::fabsf(a - b) < tol
    }

    #[test]
    fn test_nominal_point() {
        // Midscale: R_ntc ≈ R_series = R0, so ≈ 25 °C
        let t = sensor(2048, 0.0).read_celsius().unwrap();
        assert!(approx(t, 25.0, 0.05));
    }

    #[test]
    fn test_mash_temperature() {
        // 60 °C: R = 10k * exp(3950 * (1/333.15 - 1/298.15)) ≈ 2486 Ω
        // raw = 4095 * 10k / (R + 10k) ≈ 3280
        let t = sensor(3280, 0.0).read_celsius().unwrap();
        assert!(approx(t, 60.0, 0.2));
    }

    #[test]
    fn test_hotter_reads_higher() {
        // Falling NTC resistance pulls the pin toward VREF
        let cold = sensor(1000, 0.0).read_celsius().unwrap();
        let hot = sensor(3000, 0.0).read_celsius().unwrap();
        assert!(hot > cold);
    }

    #[test]
    fn test_rail_readings_are_faults() {
        assert_eq!(sensor(0, 0.0).read_celsius(), Err(SensorError::OpenCircuit));
        assert_eq!(
            sensor(4095, 0.0).read_celsius(),
            Err(SensorError::ShortCircuit)
        );
    }

    #[test]
    fn test_adc_error() {
        let mut s = BetaThermistor::new(
            DummyAdc(Err(AdcError::Conversion)),
            ThermistorConfig::default(),
            0.0,
        );
        assert_eq!(s.read_celsius(), Err(SensorError::ConversionError));
    }

    #[test]
    fn test_offset_applied() {
        let base = sensor(1500, 0.0).read_celsius().unwrap();

        let mut s = sensor(1500, 0.0);
        assert!(s.supports_calibration());
        s.set_calibration_offset(-1.5).unwrap();
        assert_eq!(s.calibration_offset(), -1.5);
        assert!(approx(s.read_celsius().unwrap(), base - 1.5, 1e-4));

        assert_eq!(
            s.set_calibration_offset(f32::NAN),
            Err(SensorError::OutOfRange)
        );
        assert_eq!(s.calibration_offset(), -1.5);
    }

    #[test]
    fn test_calibration_survives_reload() {
        let mut flash = OffsetFlash::default();
        let base = sensor(1200, 0.0).read_celsius().unwrap();

        let mut s = sensor(1200, block_on(load_offset(&mut flash)));
        assert_eq!(s.calibration_offset(), 0.0);

        s.set_calibration_offset(0.75).unwrap();
        block_on(save_offset(&mut flash, 0.75)).unwrap();

        // Fresh boot
        let mut reloaded = sensor(1200, block_on(load_offset(&mut flash)));
        assert!(approx(reloaded.read_celsius().unwrap(), base + 0.75, 1e-4));
    }
}
