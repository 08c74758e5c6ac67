//! Persisted calibration
//!
//! Two small records live in flash: the thermistor offset and the gains
//! from the last successful autotune. Each is postcard-encoded with a
//! magic number, a format version and a CRC32 so a torn or stale write is
//! detected on load. Loading never fails: anything unreadable falls back
//! to the defaults and is logged.

use brewctl_hal::{FlashError, FlashStorage, StorageKey};
use serde::{Deserialize, Serialize};

use crate::control::PidTunings;

/// Magic number of the offset record ("OFFS")
pub const OFFSET_MAGIC: u32 = 0x4F46_4653;

/// Magic number of the tunings record ("PIDC")
pub const TUNING_MAGIC: u32 = 0x5049_4443;

/// Current record format version
pub const RECORD_VERSION: u8 = 1;

/// Offset used when nothing valid is stored
pub const DEFAULT_OFFSET_C: f32 = 0.0;

/// Largest encoded record
const MAX_RECORD_SIZE: usize = 32;

/// Calibration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Flash operation failed
    Flash(FlashError),
    /// Serialization failed
    Serialize,
    /// Deserialization failed
    Deserialize,
    /// CRC check failed
    CrcMismatch,
    /// Invalid magic or version
    InvalidFormat,
    /// Stored gains are all zero
    Unconfigured,
}

impl From<FlashError> for CalibrationError {
    fn from(e: FlashError) -> Self {
        CalibrationError::Flash(e)
    }
}

/// Stored sensor calibration offset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationRecord {
    pub magic: u32,
    pub version: u8,
    /// Offset added to every conversion (°C)
    pub offset: f32,
    /// CRC32 over magic, version and offset
    pub crc: u32,
}

impl CalibrationRecord {
    pub fn new(offset: f32) -> Self {
        let mut record = Self {
            magic: OFFSET_MAGIC,
            version: RECORD_VERSION,
            offset,
            crc: 0,
        };
        record.crc = record.calculate_crc();
        record
    }

    pub fn is_valid(&self) -> bool {
        self.magic == OFFSET_MAGIC && self.version == RECORD_VERSION
    }

    pub fn calculate_crc(&self) -> u32 {
        let mut crc = 0xFFFF_FFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        crc = crc32_update(crc, &self.offset.to_le_bytes());
        !crc
    }

    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }
}

/// Stored PID gains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TuningRecord {
    pub magic: u32,
    pub version: u8,
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    pub crc: u32,
}

impl TuningRecord {
    pub fn new(tunings: PidTunings) -> Self {
        let mut record = Self {
            magic: TUNING_MAGIC,
            version: RECORD_VERSION,
            kp: tunings.kp,
            ki: tunings.ki,
            kd: tunings.kd,
            crc: 0,
        };
        record.crc = record.calculate_crc();
        record
    }

    pub fn tunings(&self) -> PidTunings {
        PidTunings::new(self.kp, self.ki, self.kd)
    }

    pub fn is_valid(&self) -> bool {
        self.magic == TUNING_MAGIC && self.version == RECORD_VERSION
    }

    pub fn calculate_crc(&self) -> u32 {
        let mut crc = 0xFFFF_FFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);
        crc = crc32_update(crc, &self.kp.to_le_bytes());
        crc = crc32_update(crc, &self.ki.to_le_bytes());
        crc = crc32_update(crc, &self.kd.to_le_bytes());
        !crc
    }

    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }
}

/// Load the calibration offset, falling back to 0.0
pub async fn load_offset<S: FlashStorage>(storage: &mut S) -> f32 {
    match load_offset_inner(storage).await {
        Ok(offset) => {
            #[cfg(feature = "defmt")]
            defmt::info!("Loaded calibration offset {}", offset);
            offset
        }
        Err(CalibrationError::Flash(FlashError::NotFound)) => {
            #[cfg(feature = "defmt")]
            defmt::debug!("No calibration offset stored, using 0.0");
            DEFAULT_OFFSET_C
        }
        Err(_e) => {
            #[cfg(feature = "defmt")]
            defmt::warn!("Failed to load calibration offset: {:?}, using 0.0", _e);
            DEFAULT_OFFSET_C
        }
    }
}

async fn load_offset_inner<S: FlashStorage>(storage: &mut S) -> Result<f32, CalibrationError> {
    let mut buffer = [0u8; MAX_RECORD_SIZE];
    let len = storage.read(StorageKey::SensorOffset, &mut buffer).await?;

    let record: CalibrationRecord =
        postcard::from_bytes(&buffer[..len]).map_err(|_| CalibrationError::Deserialize)?;

    if !record.is_valid() || !record.offset.is_finite() {
        return Err(CalibrationError::InvalidFormat);
    }
    if !record.verify_crc() {
        return Err(CalibrationError::CrcMismatch);
    }

    Ok(record.offset)
}

/// Persist the calibration offset
pub async fn save_offset<S: FlashStorage>(
    storage: &mut S,
    offset: f32,
) -> Result<(), CalibrationError> {
    let record = CalibrationRecord::new(offset);

    let mut buffer = [0u8; MAX_RECORD_SIZE];
    let bytes =
        postcard::to_slice(&record, &mut buffer).map_err(|_| CalibrationError::Serialize)?;

    storage.write(StorageKey::SensorOffset, bytes).await?;

    #[cfg(feature = "defmt")]
    defmt::info!("Saved calibration offset {}", offset);

    Ok(())
}

/// Load persisted PID gains, if any valid record exists
pub async fn load_tunings<S: FlashStorage>(storage: &mut S) -> Option<PidTunings> {
    match load_tunings_inner(storage).await {
        Ok(tunings) => {
            #[cfg(feature = "defmt")]
            defmt::info!(
                "Loaded PID tunings Kp={} Ki={} Kd={}",
                tunings.kp,
                tunings.ki,
                tunings.kd
            );
            Some(tunings)
        }
        Err(CalibrationError::Flash(FlashError::NotFound)) => None,
        Err(_e) => {
            #[cfg(feature = "defmt")]
            defmt::warn!("Failed to load PID tunings: {:?}, using defaults", _e);
            None
        }
    }
}

async fn load_tunings_inner<S: FlashStorage>(
    storage: &mut S,
) -> Result<PidTunings, CalibrationError> {
    let mut buffer = [0u8; MAX_RECORD_SIZE];
    let len = storage.read(StorageKey::PidTunings, &mut buffer).await?;

    let record: TuningRecord =
        postcard::from_bytes(&buffer[..len]).map_err(|_| CalibrationError::Deserialize)?;

    if !record.is_valid() {
        return Err(CalibrationError::InvalidFormat);
    }
    if !record.verify_crc() {
        return Err(CalibrationError::CrcMismatch);
    }

    let tunings = record.tunings();
    if !tunings.is_configured() {
        return Err(CalibrationError::Unconfigured);
    }
    Ok(tunings)
}

/// Persist PID gains
pub async fn save_tunings<S: FlashStorage>(
    storage: &mut S,
    tunings: PidTunings,
) -> Result<(), CalibrationError> {
    let record = TuningRecord::new(tunings);

    let mut buffer = [0u8; MAX_RECORD_SIZE];
    let bytes =
        postcard::to_slice(&record, &mut buffer).map_err(|_| CalibrationError::Serialize)?;

    storage.write(StorageKey::PidTunings, bytes).await?;

    #[cfg(feature = "defmt")]
    defmt::info!("Saved PID tunings");

    Ok(())
}

/// CRC32 (IEEE 802.3, reflected)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ POLY } else { crc >> 1 };
        }
    }

    crc
}
