//! Hand-written hardware mocks shared by the unit tests

use core::cell::Cell;

use brewctl_hal::{FlashError, FlashStorage, StorageKey};
use heapless::Vec;

use crate::traits::{Clock, HeaterOutput, PumpOutput, SensorError, TemperatureSensor};

/// Sensor returning whatever the test sets
pub struct MockSensor {
    pub raw: Result<f32, SensorError>,
    pub offset: f32,
    pub reads: u32,
}

impl MockSensor {
    pub fn new(temperature: f32) -> Self {
        Self {
            raw: Ok(temperature),
            offset: 0.0,
            reads: 0,
        }
    }

    pub fn set(&mut self, temperature: f32) {
        self.raw = Ok(temperature);
    }
}

impl TemperatureSensor for MockSensor {
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        self.reads += 1;
        self.raw.map(|t| t + self.offset)
    }

    fn supports_calibration(&self) -> bool {
        true
    }

    fn calibration_offset(&self) -> f32 {
        self.offset
    }

    fn set_calibration_offset(&mut self, offset: f32) -> Result<(), SensorError> {
        self.offset = offset;
        Ok(())
    }
}

/// Sensor relying on the trait's null calibration defaults
pub struct FixedSensor(pub f32);

impl TemperatureSensor for FixedSensor {
    fn read_celsius(&mut self) -> Result<f32, SensorError> {
        Ok(self.0)
    }
}

#[derive(Default)]
pub struct MockHeater {
    pub power: f32,
    pub commands: u32,
}

impl HeaterOutput for MockHeater {
    fn set_power(&mut self, percent: f32) {
        self.power = percent;
        self.commands += 1;
    }

    fn power(&self) -> f32 {
        self.power
    }
}

#[derive(Default)]
pub struct MockPump {
    pub on: bool,
}

impl PumpOutput for MockPump {
    fn set_on(&mut self, on: bool) {
        self.on = on;
    }

    fn is_on(&self) -> bool {
        self.on
    }
}

/// Manually advanced clock
pub struct MockClock {
    now: Cell<u64>,
}

impl MockClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

const SLOTS: usize = 3;
const SLOT_SIZE: usize = 64;

/// In-memory key-value flash
pub struct MemoryFlash {
    slots: [Option<Vec<u8, SLOT_SIZE>>; SLOTS],
    pub fail_writes: bool,
}

impl MemoryFlash {
    pub fn new() -> Self {
        Self {
            slots: [None, None, None],
            fail_writes: false,
        }
    }

    /// Flip the low bit of one stored byte
    pub fn corrupt(&mut self, key: StorageKey, index: usize) {
        if let Some(data) = self.slots[key.as_u8() as usize].as_mut() {
            data[index] ^= 0x01;
        }
    }
}

impl FlashStorage for MemoryFlash {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let data = self.slots[key.as_u8() as usize]
            .as_ref()
            .ok_or(FlashError::NotFound)?;
        if buffer.len() < data.len() {
            return Err(FlashError::BufferTooSmall);
        }
        buffer[..data.len()].copy_from_slice(data);
        Ok(data.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        if self.fail_writes {
            return Err(FlashError::Flash);
        }
        let stored = Vec::from_slice(data).map_err(|_| FlashError::Full)?;
        self.slots[key.as_u8() as usize] = Some(stored);
        Ok(())
    }

    async fn exists(&mut self, key: StorageKey) -> bool {
        self.slots[key.as_u8() as usize].is_some()
    }
}
