//! Control stage state machine
//!
//! The stage is a pure function of the previous stage and an event. The
//! supervisor applies events; nothing else writes the stage.

pub mod events;
pub mod machine;

pub use events::Event;
pub use machine::Stage;
