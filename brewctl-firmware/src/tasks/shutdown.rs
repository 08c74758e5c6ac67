//! Graceful shutdown task
//!
//! Stops any autotune, makes sure both outputs are off and logs a final
//! telemetry line. The other tasks keep running but the supervisor refuses
//! to drive the heater or pump again.

use defmt::*;

use crate::channels::{AUTOTUNE_CANCEL, SHUTDOWN};
use crate::controller::SharedController;
use crate::tasks::telemetry::log_snapshot;

/// Shutdown task
#[embassy_executor::task]
pub async fn shutdown_task(controller: &'static SharedController) {
    SHUTDOWN.wait().await;
    info!("Shutdown requested");

    AUTOTUNE_CANCEL.signal(());
    {
        let mut sup = controller.lock().await;
        if !sup.is_shut_down() {
            sup.shutdown();
        }
    }

    log_snapshot(controller).await;
    info!("Controller halted, power can be removed");
}
