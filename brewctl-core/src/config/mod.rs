//! Configuration types
//!
//! Controller tunables and the persisted calibration records, stored as
//! postcard binary data.

pub mod calibration;
pub mod types;

pub use calibration::*;
pub use types::*;
