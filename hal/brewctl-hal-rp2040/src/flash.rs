//! Record store on the Pico's QSPI flash
//!
//! The top 64 KB of the 2 MB part is reserved for controller records
//! (memory.x keeps the linker out of it). sequential-storage lays a
//! key-value map over that region and spreads erases across its pages.

use core::ops::Range;

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

pub use brewctl_hal::flash::{FlashError, StorageKey};

/// Size of the W25Q16 on the Pico
pub const PICO_FLASH_LEN: usize = 2 * 1024 * 1024;

/// Bytes reserved for records at the top of flash
pub const RECORD_REGION_LEN: usize = 64 * 1024;

/// Address range handed to sequential-storage
pub const RECORD_REGION: Range<u32> =
    ((PICO_FLASH_LEN - RECORD_REGION_LEN) as u32)..(PICO_FLASH_LEN as u32);

/// Largest serialized record plus map overhead
const SCRATCH_LEN: usize = 128;

/// Offset and tunings records in on-chip flash
pub struct Rp2040FlashStorage<'d> {
    flash: Flash<'d, FLASH, Async, PICO_FLASH_LEN>,
    cache: NoCache,
    scratch: [u8; SCRATCH_LEN],
}

impl<'d> Rp2040FlashStorage<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
            cache: NoCache::new(),
            scratch: [0; SCRATCH_LEN],
        }
    }

    /// Latest value stored under `key`, left in the scratch buffer
    async fn fetch(&mut self, key: StorageKey) -> Result<Option<&[u8]>, FlashError> {
        map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            RECORD_REGION,
            &mut self.cache,
            &mut self.scratch,
            &key,
        )
        .await
        .map_err(storage_error)
    }
}

fn storage_error<E>(e: sequential_storage::Error<E>) -> FlashError {
    match e {
        sequential_storage::Error::FullStorage => FlashError::Full,
        sequential_storage::Error::Storage { .. } => FlashError::Flash,
        _ => FlashError::Storage,
    }
}

impl<'d> brewctl_hal::FlashStorage for Rp2040FlashStorage<'d> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let record = self.fetch(key).await?.ok_or(FlashError::NotFound)?;
        let dest = buffer
            .get_mut(..record.len())
            .ok_or(FlashError::BufferTooSmall)?;
        dest.copy_from_slice(record);
        Ok(record.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        map::store_item(
            &mut self.flash,
            RECORD_REGION,
            &mut self.cache,
            &mut self.scratch,
            &key,
            &data,
        )
        .await
        .map_err(storage_error)
    }

    async fn exists(&mut self, key: StorageKey) -> bool {
        matches!(self.fetch(key).await, Ok(Some(_)))
    }
}
