//! Serial command intake task
//!
//! Reads `key=value&key=value` lines from the UART and applies each pair
//! to the supervisor. Pairs are independent: a bad one is logged and the
//! rest of the line still applies.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;
use heapless::Vec;

use brewctl_core::control::ParamEffect;
use brewctl_core::AutotuneConfig;
use brewctl_protocol::{ParamUpdate, Params};

use crate::channels::{AUTOTUNE_CMD, CALIBRATION_SAVE, SHUTDOWN};
use crate::controller::SharedController;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Longest accepted command line
const LINE_CAPACITY: usize = 128;

/// Serial RX task - assembles lines and dispatches parameter updates
#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: BufferedUartRx, controller: &'static SharedController) {
    info!("Serial RX task started");

    let mut buf = [0u8; RX_BUF_SIZE];
    let mut line: Vec<u8, LINE_CAPACITY> = Vec::new();
    let mut overflowed = false;

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                for &byte in &buf[..n] {
                    if byte == b'\n' || byte == b'\r' {
                        if overflowed {
                            warn!("Command line too long, dropped");
                        } else if !line.is_empty() {
                            handle_line(&line, controller).await;
                        }
                        line.clear();
                        overflowed = false;
                    } else if line.push(byte).is_err() {
                        overflowed = true;
                    }
                }
            }
            Ok(_) => {
                // No bytes read, continue
            }
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

/// Apply every pair of one command line
async fn handle_line(line: &[u8], controller: &'static SharedController) {
    let Ok(text) = core::str::from_utf8(line) else {
        warn!("Command line is not UTF-8");
        return;
    };

    for parsed in Params::new(text) {
        let update = match parsed {
            Ok(update) => update,
            Err(e) => {
                warn!("Bad parameter: {:?}", e);
                continue;
            }
        };

        let result = controller.lock().await.apply_param(update.clone());
        match result {
            Ok(effect) => dispatch_effect(&update, effect, controller).await,
            Err(e) => warn!("Parameter {:?} refused: {:?}", update, e),
        }
    }
}

/// Hand follow-up work to the task that owns it
async fn dispatch_effect(
    update: &ParamUpdate,
    effect: ParamEffect,
    controller: &'static SharedController,
) {
    match effect {
        ParamEffect::Applied => debug!("Applied {:?}", update),
        ParamEffect::PersistOffset(offset) => {
            info!("Calibration offset set to {}C", offset);
            CALIBRATION_SAVE.signal(offset);
        }
        ParamEffect::AutotuneRequested {
            relay_amplitude,
            cycles,
        } => {
            let timeout_ms = controller.lock().await.config().autotune_timeout_ms;
            AUTOTUNE_CMD.signal(
                AutotuneConfig::new(relay_amplitude, cycles).with_timeout(timeout_ms),
            );
        }
        ParamEffect::Shutdown => SHUTDOWN.signal(()),
    }
}
