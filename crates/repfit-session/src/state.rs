//! Session progression as pure value transitions.
//!
//! Every operation takes the current [`SessionState`] by value together with
//! the (immutable) exercise list and returns the next state plus the events
//! the step produced. Operations that do not apply in the current status
//! return the state unchanged with no events.
//!
//! ```text
//!              complete_set                 tick to 0 / skip_rest
//!  Exercising ─────────────▶ Resting ─────────────────────────────▶ Exercising
//!      │                      │  ▲
//!      │ final set            │  │ pause / resume
//!      ▼                      ▼  │
//!   Finished                 Paused
//! ```

use serde::{Deserialize, Serialize};

use crate::plan::WorkoutDayExercise;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Exercising,
    Resting,
    Paused,
    Finished,
}

/// What the end of the current rest leads into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestBefore {
    /// Next set of the same exercise; the set number advances when rest ends
    NextSet,
    /// First set of an exercise the index has already moved to
    FirstSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum SessionEvent {
    SetCompleted { exercise_index: usize, set: u32 },
    RestStarted { seconds: u32 },
    RestPaused,
    RestResumed,
    RestEnded { skipped: bool },
    SetStarted { exercise_index: usize, set: u32 },
    Finished,
}

/// Result of one state transition
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: SessionState,
    pub events: Vec<SessionEvent>,
}

impl Transition {
    fn unchanged(state: SessionState) -> Self {
        Self {
            state,
            events: Vec::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.events.is_empty()
    }
}

/// Progress through a workout day.
///
/// `current_set` is 1-based. `is_paused` is only ever set while resting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub current_exercise_index: usize,
    pub current_set: u32,
    pub is_resting: bool,
    pub rest_seconds_remaining: u32,
    pub is_paused: bool,
    pub is_finished: bool,
    pub rest_before: RestBefore,
}

impl SessionState {
    /// Initial state: first set of the first exercise that has any sets.
    /// A plan with nothing to do starts (and stays) finished.
    pub fn start(exercises: &[WorkoutDayExercise]) -> Self {
        match next_active(exercises, 0) {
            Some(index) => Self::exercising(index, 1),
            None => Self {
                is_finished: true,
                ..Self::exercising(0, 1)
            },
        }
    }

    fn exercising(index: usize, set: u32) -> Self {
        Self {
            current_exercise_index: index,
            current_set: set,
            is_resting: false,
            rest_seconds_remaining: 0,
            is_paused: false,
            is_finished: false,
            rest_before: RestBefore::NextSet,
        }
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_finished {
            SessionStatus::Finished
        } else if self.is_resting && self.is_paused {
            SessionStatus::Paused
        } else if self.is_resting {
            SessionStatus::Resting
        } else {
            SessionStatus::Exercising
        }
    }

    /// True when completing the current set ends the session
    pub fn is_final_set(&self, exercises: &[WorkoutDayExercise]) -> bool {
        let Some(current) = exercises.get(self.current_exercise_index) else {
            return true;
        };
        self.current_set >= current.sets
            && next_active(exercises, self.current_exercise_index + 1).is_none()
    }

    /// The user finished the set in progress
    pub fn complete_set(self, exercises: &[WorkoutDayExercise]) -> Transition {
        if self.status() != SessionStatus::Exercising {
            return Transition::unchanged(self);
        }
        let Some(current) = exercises.get(self.current_exercise_index) else {
            return Transition::unchanged(self);
        };

        let mut events = vec![SessionEvent::SetCompleted {
            exercise_index: self.current_exercise_index,
            set: self.current_set,
        }];

        if self.current_set < current.sets {
            return self.begin_rest(current.rest_period_seconds, RestBefore::NextSet, events);
        }

        match next_active(exercises, self.current_exercise_index + 1) {
            Some(next) => {
                let moved = Self {
                    current_exercise_index: next,
                    current_set: 1,
                    ..self
                };
                moved.begin_rest(exercises[next].rest_period_seconds, RestBefore::FirstSet, events)
            }
            None => {
                events.push(SessionEvent::Finished);
                Transition {
                    state: Self {
                        is_finished: true,
                        ..self
                    },
                    events,
                }
            }
        }
    }

    /// One second of rest elapsed
    pub fn tick(self) -> Transition {
        if self.status() != SessionStatus::Resting {
            return Transition::unchanged(self);
        }

        let remaining = self.rest_seconds_remaining.saturating_sub(1);
        let state = Self {
            rest_seconds_remaining: remaining,
            ..self
        };

        if remaining == 0 {
            state.end_rest(false, Vec::new())
        } else {
            Transition::unchanged(state)
        }
    }

    pub fn pause(self) -> Transition {
        if self.status() != SessionStatus::Resting {
            return Transition::unchanged(self);
        }
        Transition {
            state: Self {
                is_paused: true,
                ..self
            },
            events: vec![SessionEvent::RestPaused],
        }
    }

    pub fn resume(self) -> Transition {
        if self.status() != SessionStatus::Paused {
            return Transition::unchanged(self);
        }
        Transition {
            state: Self {
                is_paused: false,
                ..self
            },
            events: vec![SessionEvent::RestResumed],
        }
    }

    /// End the rest now, paused or not
    pub fn skip_rest(self) -> Transition {
        if !self.is_resting || self.is_finished {
            return Transition::unchanged(self);
        }
        Self {
            rest_seconds_remaining: 0,
            ..self
        }
        .end_rest(true, Vec::new())
    }

    fn begin_rest(self, seconds: u32, before: RestBefore, mut events: Vec<SessionEvent>) -> Transition {
        let state = Self {
            rest_before: before,
            ..self
        };

        if seconds == 0 {
            return state.end_rest(false, events);
        }

        events.push(SessionEvent::RestStarted { seconds });
        Transition {
            state: Self {
                is_resting: true,
                is_paused: false,
                rest_seconds_remaining: seconds,
                ..state
            },
            events,
        }
    }

    fn end_rest(self, skipped: bool, mut events: Vec<SessionEvent>) -> Transition {
        let current_set = match self.rest_before {
            RestBefore::NextSet => self.current_set + 1,
            RestBefore::FirstSet => self.current_set,
        };

        if self.is_resting {
            events.push(SessionEvent::RestEnded { skipped });
        }
        events.push(SessionEvent::SetStarted {
            exercise_index: self.current_exercise_index,
            set: current_set,
        });

        Transition {
            state: Self {
                current_set,
                is_resting: false,
                is_paused: false,
                rest_seconds_remaining: 0,
                rest_before: RestBefore::NextSet,
                ..self
            },
            events,
        }
    }
}

/// Index of the first exercise at or after `from` with at least one set
fn next_active(exercises: &[WorkoutDayExercise], from: usize) -> Option<usize> {
    exercises
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, e)| e.sets > 0)
        .map(|(i, _)| i)
}
