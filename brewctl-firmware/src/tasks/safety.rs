//! Safety supervision task
//!
//! Runs the fault latch and overheat guard on its own cadence so a
//! stalled control loop cannot hide a bad sensor.

use defmt::*;
use embassy_time::{Duration, Ticker};

use brewctl_core::{SafetyMonitor, SafetyStatus};

use crate::controller::SharedController;

/// Safety monitor task
#[embassy_executor::task]
pub async fn safety_task(controller: &'static SharedController) {
    let (mut monitor, interval_ms) = {
        let sup = controller.lock().await;
        (
            SafetyMonitor::new(sup.config()),
            sup.config().safety_interval_ms,
        )
    };
    info!(
        "Safety task started (max faults {}, {} ms)",
        monitor.max_faults(),
        interval_ms
    );

    let mut ticker = Ticker::every(Duration::from_millis(interval_ms as u64));
    let mut last_status = SafetyStatus::Ok;

    loop {
        ticker.next().await;

        let status = {
            let mut sup = controller.lock().await;
            monitor.check(&mut *sup)
        };

        if status != last_status {
            match status {
                SafetyStatus::Ok => info!("Safety status OK"),
                SafetyStatus::OverheatPaused => warn!("Heating paused for overheat"),
                SafetyStatus::FaultLatched => error!(
                    "Sensor fault latched after {} bad readings",
                    monitor.fault_count()
                ),
            }
            last_status = status;
        }
    }
}
