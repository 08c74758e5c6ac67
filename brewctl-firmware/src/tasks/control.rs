//! Control tick task
//!
//! Every tick: read the sensor, advance the mash program, and command the
//! heater from the PID (or the relay while an autotune runs).

use defmt::*;
use embassy_time::{Duration, Ticker};

use crate::controller::SharedController;

/// Control loop task
#[embassy_executor::task]
pub async fn control_task(controller: &'static SharedController) {
    let interval_ms = controller.lock().await.config().control_interval_ms;
    info!("Control task started ({} ms tick)", interval_ms);

    let mut ticker = Ticker::every(Duration::from_millis(interval_ms as u64));
    let mut sensor_ok = true;

    loop {
        ticker.next().await;

        let mut sup = controller.lock().await;

        // Only log changes, the tick is too fast for per-reading warnings
        match sup.update_temperature() {
            Ok(temp) => {
                if !sensor_ok {
                    info!("Sensor reading recovered: {}C", temp);
                    sensor_ok = true;
                }
            }
            Err(e) => {
                if sensor_ok {
                    warn!("Sensor reading rejected: {:?}", e);
                    sensor_ok = false;
                }
            }
        }

        sup.mash_tick();
        let output = sup.get_heater_output();
        trace!("Heater output: {}%", output);
    }
}
