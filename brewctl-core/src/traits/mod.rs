//! Hardware abstraction traits
//!
//! These traits define the interface between the board-agnostic control
//! logic and hardware-specific drivers. The supervisor owns one instance
//! of each, constructed once at boot and passed in explicitly.

pub mod actuator;
pub mod clock;
pub mod sensor;

pub use actuator::{HeaterOutput, PumpOutput};
pub use clock::Clock;
pub use sensor::{SensorError, TemperatureSensor};
