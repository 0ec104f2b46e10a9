//! Exercise-specific joint selection and the per-frame counter.

use std::fmt;
use std::str::FromStr;

use repfit_core::{
    bilateral_angle, joint_angle, Error, Landmark, Pose, RepfitConfig, Result, ThresholdConfig,
};
use serde::{Deserialize, Serialize};

use crate::phase::{Feedback, RepPhase, RepResult};
use crate::thresholds::Thresholds;

/// Exercises with a camera-based counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    PushUp,
    Squat,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 2] = [ExerciseKind::PushUp, ExerciseKind::Squat];

    pub fn tracked_limbs(&self) -> TrackedLimbs {
        match self {
            ExerciseKind::PushUp => TrackedLimbs::Arms,
            ExerciseKind::Squat => TrackedLimbs::Legs,
        }
    }

    /// Left and right joint triplets whose angle drives the count
    pub fn joints(&self) -> BilateralJoint {
        match self {
            ExerciseKind::PushUp => BilateralJoint {
                left: JointTriplet::new(
                    Landmark::LeftShoulder,
                    Landmark::LeftElbow,
                    Landmark::LeftWrist,
                ),
                right: JointTriplet::new(
                    Landmark::RightShoulder,
                    Landmark::RightElbow,
                    Landmark::RightWrist,
                ),
            },
            ExerciseKind::Squat => BilateralJoint {
                left: JointTriplet::new(
                    Landmark::LeftHip,
                    Landmark::LeftKnee,
                    Landmark::LeftAnkle,
                ),
                right: JointTriplet::new(
                    Landmark::RightHip,
                    Landmark::RightKnee,
                    Landmark::RightAnkle,
                ),
            },
        }
    }

    pub fn thresholds_from<'a>(&self, config: &'a RepfitConfig) -> &'a ThresholdConfig {
        match self {
            ExerciseKind::PushUp => &config.counter.push_up,
            ExerciseKind::Squat => &config.counter.squat,
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseKind::PushUp => f.write_str("push_up"),
            ExerciseKind::Squat => f.write_str("squat"),
        }
    }
}

impl FromStr for ExerciseKind {
    type Err = Error;

    /// Accepts plain names ("push-up", "Squats") and legacy counter keys ("pushUpsCounter")
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        let stem = normalized.strip_suffix("counter").unwrap_or(&normalized);

        match stem {
            "pushup" | "pushups" => Ok(ExerciseKind::PushUp),
            "squat" | "squats" => Ok(ExerciseKind::Squat),
            _ => Err(Error::UnknownExercise(s.to_string())),
        }
    }
}

/// Body region whose visibility the counter depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedLimbs {
    Arms,
    Legs,
}

/// Three landmarks whose interior angle is measured at `joint`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointTriplet {
    pub proximal: Landmark,
    pub joint: Landmark,
    pub distal: Landmark,
}

impl JointTriplet {
    pub fn new(proximal: Landmark, joint: Landmark, distal: Landmark) -> Self {
        Self {
            proximal,
            joint,
            distal,
        }
    }

    pub fn landmarks(&self) -> [Landmark; 3] {
        [self.proximal, self.joint, self.distal]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilateralJoint {
    pub left: JointTriplet,
    pub right: JointTriplet,
}

impl BilateralJoint {
    pub fn landmarks(&self) -> impl Iterator<Item = Landmark> {
        self.left
            .landmarks()
            .into_iter()
            .chain(self.right.landmarks())
    }
}

/// Repetition counter for one exercise: a joint selector plus a threshold set.
///
/// Evaluation is a pure function of the pose and the phase passed in; the
/// caller owns the phase between frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseCounter {
    kind: ExerciseKind,
    joints: BilateralJoint,
    thresholds: Thresholds,
}

impl ExerciseCounter {
    pub fn new(kind: ExerciseKind, joints: BilateralJoint, thresholds: Thresholds) -> Self {
        Self {
            kind,
            joints,
            thresholds,
        }
    }

    pub fn for_kind(kind: ExerciseKind, thresholds: Thresholds) -> Self {
        Self::new(kind, kind.joints(), thresholds)
    }

    pub fn from_config(kind: ExerciseKind, config: &RepfitConfig) -> Result<Self> {
        let thresholds = Thresholds::new(*kind.thresholds_from(config))?;
        Ok(Self::for_kind(kind, thresholds))
    }

    pub fn push_up() -> Self {
        Self::for_kind(ExerciseKind::PushUp, Thresholds::default())
    }

    pub fn squat() -> Self {
        Self::for_kind(ExerciseKind::Squat, Thresholds::default())
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn joints(&self) -> &BilateralJoint {
        &self.joints
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Averaged joint angle in degrees, or `None` if any required keypoint is
    /// absent, not confident enough, or collapsed onto its neighbour
    pub fn measure(&self, pose: &Pose) -> Option<f64> {
        let left = self.side_angle(pose, &self.joints.left)?;
        let right = self.side_angle(pose, &self.joints.right)?;
        bilateral_angle(Some(left), Some(right))
    }

    fn side_angle(&self, pose: &Pose, triplet: &JointTriplet) -> Option<f64> {
        let [a, b, c] = triplet
            .landmarks()
            .map(|lm| pose.find(lm).filter(|kp| self.thresholds.is_confident(kp)));
        joint_angle(a?, b?, c?)
    }

    /// Evaluate one frame against the phase carried over from the previous one
    pub fn evaluate(&self, pose: &Pose, current: RepPhase) -> RepResult {
        let Some(angle) = self.measure(pose) else {
            return RepResult::rejected(current, self.kind.tracked_limbs());
        };

        let posture = self.thresholds.classify(angle);
        let (next, rep_completed) = current.advance(posture);

        let cue = if rep_completed {
            tracing::trace!(kind = %self.kind, angle, "repetition credited");
            Feedback::RepDone
        } else if next == RepPhase::Down && current != RepPhase::Down {
            Feedback::ReachedBottom { kind: self.kind }
        } else {
            Feedback::holding(next, self.kind)
        };

        RepResult::new(next, rep_completed, cue, Some(angle))
    }
}
