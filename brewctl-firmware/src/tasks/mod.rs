//! Embassy async tasks
//!
//! Each task runs independently. Control state is shared through the
//! supervisor mutex; side work is handed off via signals.

pub mod autotune;
pub mod calibration;
pub mod control;
pub mod safety;
pub mod serial_rx;
pub mod shutdown;
pub mod telemetry;

pub use autotune::autotune_task;
pub use calibration::calibration_task;
pub use control::control_task;
pub use safety::safety_task;
pub use serial_rx::serial_rx_task;
pub use shutdown::shutdown_task;
pub use telemetry::telemetry_task;
