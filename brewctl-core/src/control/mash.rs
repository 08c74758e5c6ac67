//! Mash step programs
//!
//! A program is an ordered list of rests. Each rest is reached, then held
//! within the tolerance band for its duration before the next one starts.

use brewctl_protocol::{MashRest, MAX_MASH_RESTS};
use heapless::Vec;

/// Maximum rests in one program (same bound as the `mash=` command)
pub const MAX_MASH_STEPS: usize = MAX_MASH_RESTS;

/// A single rest
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MashStep {
    /// Rest temperature (°C)
    pub target_c: f32,
    /// Hold time once at temperature (seconds)
    pub hold_s: u32,
}

impl MashStep {
    pub const fn new(target_c: f32, hold_s: u32) -> Self {
        Self { target_c, hold_s }
    }

    fn hold_ms(&self) -> u64 {
        self.hold_s as u64 * 1000
    }
}

impl From<MashRest> for MashStep {
    fn from(rest: MashRest) -> Self {
        Self::new(rest.target_c, rest.hold_s)
    }
}

/// Ordered rests of one mash
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MashProgram {
    steps: Vec<MashStep, MAX_MASH_STEPS>,
}

impl MashProgram {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Build from a slice; returns `None` if it has too many steps
    pub fn from_steps(steps: &[MashStep]) -> Option<Self> {
        Vec::from_slice(steps).ok().map(|steps| Self { steps })
    }

    /// Build from the rests of a `mash=` command
    pub fn from_rests(rests: &[MashRest]) -> Self {
        Self {
            steps: rests.iter().copied().map(MashStep::from).take(MAX_MASH_STEPS).collect(),
        }
    }

    /// Append a rest, handing it back if the program is full
    pub fn push(&mut self, step: MashStep) -> Result<(), MashStep> {
        self.steps.push(step)
    }

    pub fn get(&self, index: usize) -> Option<&MashStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// What a progress check asks the supervisor to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum MashProgress {
    /// Keep going
    Holding,
    /// Move to the rest at this target
    NextStep(f32),
    /// Last rest done
    Finished,
}

/// Progress through a running program
#[derive(Debug, Clone)]
pub(crate) struct MashRun {
    program: MashProgram,
    index: usize,
    hold_started_ms: Option<u64>,
}

impl MashRun {
    pub(crate) fn new(program: MashProgram) -> Self {
        Self {
            program,
            index: 0,
            hold_started_ms: None,
        }
    }

    pub(crate) fn current(&self) -> Option<&MashStep> {
        self.program.get(self.index)
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    /// Feed one reading
    ///
    /// The hold timer starts when the reading enters the band and restarts
    /// whenever it leaves.
    pub(crate) fn advance(
        &mut self,
        temperature_c: Option<f32>,
        tolerance_c: f32,
        now_ms: u64,
    ) -> MashProgress {
        let Some(step) = self.current().copied() else {
            return MashProgress::Finished;
        };

        let in_band = temperature_c
            .is_some_and(|t| libm::fabsf(t - step.target_c) <= tolerance_c);
        if !in_band {
            self.hold_started_ms = None;
            return MashProgress::Holding;
        }

        let started = *self.hold_started_ms.get_or_insert(now_ms);
        if now_ms.saturating_sub(started) < step.hold_ms() {
            return MashProgress::Holding;
        }

        self.index += 1;
        self.hold_started_ms = None;
        match self.current() {
            Some(next) => MashProgress::NextStep(next.target_c),
            None => MashProgress::Finished,
        }
    }
}
