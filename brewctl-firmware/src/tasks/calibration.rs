//! Calibration persistence task
//!
//! Owns the flash storage and writes the sensor offset and autotuned gains
//! when asked. Flash writes stall the bus, so they happen here rather than
//! under the supervisor lock.

use defmt::*;
use embassy_futures::select::{select, Either};

use brewctl_core::config::{save_offset, save_tunings};
use brewctl_hal_rp2040::Rp2040FlashStorage;

use crate::channels::{CALIBRATION_SAVE, TUNINGS_SAVE};

/// Calibration task - handles flash persistence
#[embassy_executor::task]
pub async fn calibration_task(mut storage: Rp2040FlashStorage<'static>) {
    info!("Calibration task started");

    loop {
        match select(CALIBRATION_SAVE.wait(), TUNINGS_SAVE.wait()).await {
            Either::First(offset) => {
                info!("Saving calibration offset {}C", offset);
                match save_offset(&mut storage, offset).await {
                    Ok(()) => info!("Calibration offset saved"),
                    Err(e) => error!("Failed to save calibration offset: {:?}", e),
                }
            }
            Either::Second(tunings) => {
                info!(
                    "Saving tunings: Kp={} Ki={} Kd={}",
                    tunings.kp, tunings.ki, tunings.kd
                );
                match save_tunings(&mut storage, tunings).await {
                    Ok(()) => info!("Tunings saved"),
                    Err(e) => error!("Failed to save tunings: {:?}", e),
                }
            }
        }
    }
}
