//! Workout plan data as delivered by the plan service.

use repfit_core::{DayId, Result};
use repfit_counter::{ExerciseKind, RepTarget};
use serde::{Deserialize, Serialize};

/// One exercise slot in a workout day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ExerciseSlotPayload")]
pub struct WorkoutDayExercise {
    pub exercise_id: u64,

    pub name: Option<String>,

    /// Number of sets; zero-set entries are skipped by the session
    pub sets: u32,

    /// Free-text rep goal, e.g. "12", "8-12", "AMRAP"
    pub reps: String,

    #[serde(alias = "rest_period")]
    pub rest_period_seconds: u32,

    #[serde(default)]
    pub order: u32,

    /// Camera counter for this exercise, if it supports one
    pub counter: Option<ExerciseKind>,
}

/// Wire shape of an exercise slot. The plan service nests the full exercise
/// record under `exercise`; stored plans carry a bare `exercise_id`.
#[derive(Deserialize)]
struct ExerciseSlotPayload {
    #[serde(alias = "exercise")]
    exercise_id: ExerciseRef,
    #[serde(default)]
    name: Option<String>,
    sets: u32,
    reps: String,
    #[serde(alias = "rest_period")]
    rest_period_seconds: u32,
    #[serde(default)]
    order: u32,
    #[serde(default)]
    counter: Option<ExerciseKind>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExerciseRef {
    Id(u64),
    Detail(ExerciseDetail),
}

#[derive(Deserialize)]
struct ExerciseDetail {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    rep_counting_logic: Option<String>,
}

impl From<ExerciseSlotPayload> for WorkoutDayExercise {
    fn from(payload: ExerciseSlotPayload) -> Self {
        let (exercise_id, detail_name, logic) = match payload.exercise_id {
            ExerciseRef::Id(id) => (id, None, None),
            ExerciseRef::Detail(detail) => (detail.id, detail.name, detail.rep_counting_logic),
        };

        let counter = payload.counter.or_else(|| {
            let logic = logic?;
            match logic.parse::<ExerciseKind>() {
                Ok(kind) => Some(kind),
                Err(e) => {
                    tracing::debug!(exercise = exercise_id, "No camera counter: {}", e);
                    None
                }
            }
        });

        Self {
            exercise_id,
            name: payload.name.or(detail_name),
            sets: payload.sets,
            reps: payload.reps,
            rest_period_seconds: payload.rest_period_seconds,
            order: payload.order,
            counter,
        }
    }
}

impl WorkoutDayExercise {
    pub fn new(exercise_id: u64, sets: u32, reps: impl Into<String>, rest_period_seconds: u32) -> Self {
        Self {
            exercise_id,
            name: None,
            sets,
            reps: reps.into(),
            rest_period_seconds,
            order: 0,
            counter: None,
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn with_counter(mut self, kind: ExerciseKind) -> Self {
        self.counter = Some(kind);
        self
    }

    pub fn rep_target(&self) -> RepTarget {
        RepTarget::parse_lenient(&self.reps)
    }
}

/// All exercises scheduled for one plan day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDay {
    #[serde(alias = "id")]
    pub day_id: DayId,

    #[serde(default)]
    pub title: Option<String>,

    pub exercises: Vec<WorkoutDayExercise>,
}

impl WorkoutDay {
    pub fn new(day_id: DayId, exercises: Vec<WorkoutDayExercise>) -> Self {
        Self {
            day_id,
            title: None,
            exercises,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Exercises in their scheduled order (stable for equal `order`)
    pub fn into_ordered(mut self) -> Self {
        self.exercises.sort_by_key(|e| e.order);
        self
    }

    pub fn total_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.sets).sum()
    }
}
