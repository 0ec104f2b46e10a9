//! Per-set rep tracking on top of a stateless counter.

use repfit_core::Pose;
use serde::{Deserialize, Serialize};

use crate::exercise::ExerciseCounter;
use crate::phase::{RepPhase, RepResult};
use crate::target::RepTarget;

/// Outcome of feeding one frame to a [`RepTracker`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepObservation {
    pub result: RepResult,
    /// Reps counted in this set so far, including this frame
    pub reps: u32,
    /// True only on the frame that reaches the target count
    pub target_reached: bool,
}

/// Owns the phase and rep count of one set attempt
#[derive(Debug, Clone)]
pub struct RepTracker {
    counter: ExerciseCounter,
    target: RepTarget,
    phase: RepPhase,
    reps: u32,
}

impl RepTracker {
    /// Sets start with the limb extended, so the first full descent-and-return counts.
    pub const START_PHASE: RepPhase = RepPhase::Up;

    pub fn new(counter: ExerciseCounter, target: RepTarget) -> Self {
        Self {
            counter,
            target,
            phase: Self::START_PHASE,
            reps: 0,
        }
    }

    pub fn counter(&self) -> &ExerciseCounter {
        &self.counter
    }

    pub fn target(&self) -> RepTarget {
        self.target
    }

    pub fn phase(&self) -> RepPhase {
        self.phase
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }

    /// Frames must arrive in capture order; the phase history is sequence-sensitive.
    pub fn observe(&mut self, pose: &Pose) -> RepObservation {
        let result = self.counter.evaluate(pose, self.phase);
        self.phase = result.new_phase;

        let mut target_reached = false;
        if result.rep_completed {
            self.reps += 1;
            target_reached = self.target.auto_complete_at() == Some(self.reps);
        }

        RepObservation {
            result,
            reps: self.reps,
            target_reached,
        }
    }

    /// Start a fresh set
    pub fn reset(&mut self) {
        self.phase = Self::START_PHASE;
        self.reps = 0;
    }
}
