//! Temperature sensor drivers

pub mod beta;

pub use beta::{BetaThermistor, ThermistorConfig};
