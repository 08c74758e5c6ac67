//! Persistent record storage
//!
//! The controller keeps two small records across power cycles: the sensor
//! calibration offset and the autotuned PID gains. Each lives under its own
//! one-byte key; the backend decides how records are laid out in flash.

/// Record slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Thermistor calibration offset
    SensorOffset = 0,
    /// PID gains from the last successful autotune
    PidTunings = 1,
}

impl StorageKey {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::SensorOffset),
            1 => Some(StorageKey::PidTunings),
            _ => None,
        }
    }
}

/// Storage backend failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Low-level flash read, write or erase failed
    Flash,
    /// Backend bookkeeping failed
    Storage,
    /// Nothing stored under the key
    NotFound,
    /// Caller's buffer cannot hold the record
    BufferTooSmall,
    /// Stored bytes are unreadable
    Corrupted,
    /// No room left for the record
    Full,
}

/// Async key-value record store
///
/// A successful `write` replaces the previous record atomically: a reader
/// sees either the old record or the new one, never a mix.
pub trait FlashStorage {
    /// Copy the record under `key` into `buffer`, returning its length
    fn read(
        &mut self,
        key: StorageKey,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, FlashError>>;

    /// Store `data` under `key`
    fn write(
        &mut self,
        key: StorageKey,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), FlashError>>;

    /// Whether a record is stored under `key`
    fn exists(&mut self, key: StorageKey) -> impl core::future::Future<Output = bool>;
}

// Implement the sequential-storage Key trait when the feature is enabled
#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[0] = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        match StorageKey::from_u8(buffer[0]) {
            Some(key) => Ok((key, 1)),
            None => Err(sequential_storage::map::SerializationError::InvalidFormat),
        }
    }
}
