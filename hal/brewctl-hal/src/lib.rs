//! brewctl Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the controller logic and drivers
//! are written against. Chip-specific crates (currently RP2040) implement
//! them, and host tests implement them with mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  brewctl-core / brewctl-drivers         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  brewctl-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!            ┌─────────────────┐
//!            │ brewctl-hal-    │
//!            │    rp2040       │
//!            └─────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Digital output (pump relay)
//! - [`pwm::PwmPin`] - PWM channel (heater SSR drive)
//! - [`adc::AdcReader`] - Analog input (thermistor divider)
//! - [`flash::FlashStorage`] - Persistent key-value storage

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod flash;
pub mod gpio;
pub mod pwm;

// Re-export key traits at crate root for convenience
pub use adc::{AdcError, AdcReader};
pub use flash::{FlashError, FlashStorage, StorageKey};
pub use gpio::OutputPin;
pub use pwm::PwmPin;
