//! Autotune task
//!
//! Waits for a start request, then samples the relay experiment on its own
//! cadence until it completes, fails, times out or is cancelled. The
//! control task keeps driving the heater from the relay state meanwhile.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Ticker};

use brewctl_core::{AutotuneState, Autotuner};

use crate::channels::{AUTOTUNE_CANCEL, AUTOTUNE_CMD, TUNINGS_SAVE};
use crate::controller::SharedController;

/// Autotune task
#[embassy_executor::task]
pub async fn autotune_task(controller: &'static SharedController) {
    info!("Autotune task started");

    let mut tuner = Autotuner::new();

    loop {
        let request = AUTOTUNE_CMD.wait().await;

        // A cancel sent while idle must not abort the next session
        AUTOTUNE_CANCEL.reset();

        let sample_ms = {
            let mut sup = controller.lock().await;
            if let Err(e) = tuner.start(&mut *sup, request) {
                warn!("Autotune not started: {:?}", e);
                continue;
            }
            sup.config().autotune_sample_ms
        };

        let mut ticker = Ticker::every(Duration::from_millis(sample_ms as u64));

        loop {
            match select(ticker.next(), AUTOTUNE_CANCEL.wait()).await {
                Either::First(_) => {
                    let state = {
                        let mut sup = controller.lock().await;
                        tuner.update(&mut *sup)
                    };

                    match state {
                        AutotuneState::Running => {
                            trace!("Autotune: {} half-periods", tuner.half_period_count());
                        }
                        AutotuneState::Complete => {
                            if let Some(result) = tuner.result() {
                                info!(
                                    "Autotune done: Ku={} Tu={}s over {}..{}C",
                                    result.ku, result.tu_s, result.min_c, result.max_c
                                );
                                TUNINGS_SAVE.signal(result.tunings);
                            }
                            break;
                        }
                        AutotuneState::Failed(e) => {
                            warn!("Autotune failed: {:?}", e);
                            break;
                        }
                        AutotuneState::Idle => break,
                    }
                }
                Either::Second(()) => {
                    let mut sup = controller.lock().await;
                    tuner.cancel(&mut *sup);
                    info!("Autotune cancelled");
                    break;
                }
            }
        }
    }
}
