//! Events that trigger stage transitions

/// Events that can move the controller between stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Operator switched heating on
    StartHeating,
    /// Operator marked the manual run complete
    Complete,
    /// Operator started a mash step program
    StartMash,
    /// Last mash step finished its hold
    MashFinished,
    /// Safety subsystem latched a fault
    FaultDetected,
    /// Operator acknowledged the fault
    AcknowledgeFault,
    /// Operator stopped the run
    Abort,
}

