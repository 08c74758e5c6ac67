//! Stage definition and transitions

use super::events::Event;

/// Controller stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// Nothing running
    #[default]
    Idle,
    /// Manual heating toward the operator setpoint
    Heating,
    /// Run finished
    Completed,
    /// Safety latch tripped; heater disabled until acknowledged
    Fault,
    /// Mash step program in progress
    AutoMash,
}

impl Stage {
    /// Display name as reported in telemetry
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "Idle",
            Stage::Heating => "Heating",
            Stage::Completed => "Completed",
            Stage::Fault => "Fault",
            Stage::AutoMash => "Auto_Mash",
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, Stage::Fault)
    }

    /// Check if a run (manual or mash) is active
    pub fn is_active(&self) -> bool {
        matches!(self, Stage::Heating | Stage::AutoMash)
    }

    /// Process an event and return the next stage
    ///
    /// Unhandled events leave the stage unchanged. `Fault` is only left
    /// through `AcknowledgeFault`.
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use Stage::*;

        match (self, event) {
            (Fault, AcknowledgeFault) => Idle,
            (Fault, _) => Fault,

            (_, FaultDetected) => Fault,

            (Idle | Completed, StartHeating) => Heating,
            (Idle | Completed | Heating, StartMash) => AutoMash,

            (Heating, Complete) => Completed,
            (AutoMash, MashFinished) => Completed,

            (Heating | AutoMash, Abort) => Idle,

            (stage, _) => stage,
        }
    }
}
