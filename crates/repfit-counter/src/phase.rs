//! Repetition phases, the hysteresis transition table and per-frame results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::exercise::{ExerciseKind, TrackedLimbs};
use crate::thresholds::LimbPosture;

/// Coarse position of the tracked limb within a repetition cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepPhase {
    /// Limb extended (top of a push-up, standing tall in a squat)
    Up,
    /// Limb flexed (bottom of the movement)
    Down,
    /// No position established yet
    #[default]
    Neutral,
}

impl RepPhase {
    /// Apply one classified frame. Returns the next phase and whether a rep was credited.
    ///
    /// A rep is credited only on the Down -> Up edge, so a descent that never
    /// returns to full extension is never counted. Frames inside the dead zone
    /// keep the current phase.
    pub fn advance(self, posture: LimbPosture) -> (RepPhase, bool) {
        match (self, posture) {
            (RepPhase::Up, LimbPosture::Flexed) => (RepPhase::Down, false),
            (RepPhase::Down, LimbPosture::Extended) => (RepPhase::Up, true),
            (RepPhase::Neutral, LimbPosture::Flexed) => (RepPhase::Down, false),
            (RepPhase::Neutral, LimbPosture::Extended) => (RepPhase::Up, false),
            (phase, _) => (phase, false),
        }
    }
}

impl fmt::Display for RepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepPhase::Up => "up",
            RepPhase::Down => "down",
            RepPhase::Neutral => "neutral",
        };
        f.write_str(s)
    }
}

/// Coaching cue attached to every counter result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "cue")]
pub enum Feedback {
    /// A required keypoint is missing or below the confidence floor
    LimbsNotVisible { limbs: TrackedLimbs },
    /// Just reached the bottom of the movement
    ReachedBottom { kind: ExerciseKind },
    /// Just completed a repetition
    RepDone,
    /// Holding the top position
    LowerDown,
    /// Holding the bottom position
    Rise { kind: ExerciseKind },
    /// No phase yet and the angle sits in the dead zone
    GetInPosition { kind: ExerciseKind },
}

impl Feedback {
    /// Cue for a frame that produced no transition
    pub fn holding(phase: RepPhase, kind: ExerciseKind) -> Self {
        match phase {
            RepPhase::Up => Feedback::LowerDown,
            RepPhase::Down => Feedback::Rise { kind },
            RepPhase::Neutral => Feedback::GetInPosition { kind },
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Feedback::LimbsNotVisible {
                limbs: TrackedLimbs::Arms,
            } => "Can't see your arms clearly, adjust the camera angle.",
            Feedback::LimbsNotVisible {
                limbs: TrackedLimbs::Legs,
            } => "Can't see your legs clearly, keep a suitable distance.",
            Feedback::ReachedBottom {
                kind: ExerciseKind::PushUp,
            } => "Good depth! Push back up!",
            Feedback::ReachedBottom {
                kind: ExerciseKind::Squat,
            } => "Good depth! Stand back up!",
            Feedback::RepDone => "Nice rep! Lower down again.",
            Feedback::LowerDown => "Lower your body down",
            Feedback::Rise {
                kind: ExerciseKind::PushUp,
            } => "Push your body up",
            Feedback::Rise {
                kind: ExerciseKind::Squat,
            } => "Stand up",
            Feedback::GetInPosition {
                kind: ExerciseKind::PushUp,
            } => "Get into a push-up position",
            Feedback::GetInPosition {
                kind: ExerciseKind::Squat,
            } => "Stand tall to begin",
        };
        f.write_str(s)
    }
}

/// Outcome of evaluating one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepResult {
    pub new_phase: RepPhase,
    pub rep_completed: bool,
    pub feedback: String,
    pub cue: Feedback,
    /// Averaged joint angle in degrees, absent when the frame was rejected
    pub angle: Option<f64>,
}

impl RepResult {
    pub(crate) fn new(
        new_phase: RepPhase,
        rep_completed: bool,
        cue: Feedback,
        angle: Option<f64>,
    ) -> Self {
        Self {
            new_phase,
            rep_completed,
            feedback: cue.to_string(),
            cue,
            angle,
        }
    }

    /// Frame could not be used; phase is carried through unchanged
    pub(crate) fn rejected(phase: RepPhase, limbs: TrackedLimbs) -> Self {
        Self::new(phase, false, Feedback::LimbsNotVisible { limbs }, None)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.cue, Feedback::LimbsNotVisible { .. })
    }
}
