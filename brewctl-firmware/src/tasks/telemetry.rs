//! Telemetry log task
//!
//! Emits one CSV record per interval:
//! `HH:MM:SS,temperature,setpoint,heater_output,pump`.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};

use crate::controller::SharedController;

/// Telemetry logging task
#[embassy_executor::task]
pub async fn telemetry_task(controller: &'static SharedController) {
    let interval_ms = controller.lock().await.config().telemetry_interval_ms;
    info!("Telemetry task started ({} ms)", interval_ms);

    let mut ticker = Ticker::every(Duration::from_millis(interval_ms as u64));

    loop {
        ticker.next().await;
        log_snapshot(controller).await;
    }
}

/// Log the current controller state as one CSV line
pub async fn log_snapshot(controller: &'static SharedController) {
    let snapshot = controller.lock().await.snapshot();
    let record = snapshot.to_log_record(Instant::now().as_secs());

    match record.to_line() {
        Ok(line) => info!("{}", line.as_str()),
        Err(_) => warn!("Telemetry line did not fit the log buffer"),
    }
    debug!(
        "stage={} enabled={} heating={} kp={} ki={} kd={}",
        snapshot.stage.as_str(),
        snapshot.heater_enabled,
        snapshot.heating_on,
        snapshot.kp,
        snapshot.ki,
        snapshot.kd
    );
}
