//! Workout session controller: owns one live session for one user.

use repfit_core::{DayId, Pose, RepfitConfig, Result, SessionId};
use repfit_counter::{ExerciseCounter, RepObservation, RepPhase, RepTracker};
use serde::{Deserialize, Serialize};

use crate::plan::{WorkoutDay, WorkoutDayExercise};
use crate::progress::DayCompletion;
use crate::state::{SessionEvent, SessionState, SessionStatus, Transition};

/// UI-facing view of the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub day_id: DayId,
    pub status: SessionStatus,
    pub exercise_index: usize,
    pub exercise_count: usize,
    pub exercise_id: Option<u64>,
    pub exercise_name: Option<String>,
    pub current_set: u32,
    pub total_sets: u32,
    pub reps: String,
    /// Camera-counted reps in the current set, if the exercise has a counter
    pub reps_counted: Option<u32>,
    pub phase: Option<RepPhase>,
    pub feedback: Option<String>,
    pub rest_seconds_remaining: u32,
    /// Remaining fraction of the rest period, 1.0 at rest start
    pub rest_progress: f64,
    pub is_paused: bool,
    pub is_final_set: bool,
}

/// What one camera frame did to the session
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUpdate {
    pub observation: RepObservation,
    /// Set-completion transition triggered by reaching the rep target
    pub events: Vec<SessionEvent>,
}

/// What the session amounted to when it ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub day_id: DayId,
    pub sets_completed: u32,
    pub finished: bool,
}

/// Drives a user through a workout day.
///
/// Single-writer: the host must serialize frame, timer and user calls.
pub struct WorkoutSessionController {
    id: SessionId,
    day: WorkoutDay,
    state: SessionState,
    /// Per-exercise counters, aligned with `day.exercises`
    counters: Vec<Option<ExerciseCounter>>,
    tracker: Option<RepTracker>,
    last_feedback: Option<String>,
    sets_completed: u32,
    pending_completion: Option<DayCompletion>,
    completion_emitted: bool,
}

impl WorkoutSessionController {
    pub fn new(day: WorkoutDay, config: &RepfitConfig) -> Result<Self> {
        let day = day.into_ordered();
        let counters = day
            .exercises
            .iter()
            .map(|e| {
                e.counter
                    .map(|kind| ExerciseCounter::from_config(kind, config))
                    .transpose()
            })
            .collect::<Result<Vec<_>>>()?;
        let state = SessionState::start(&day.exercises);

        let mut controller = Self {
            id: SessionId::new(),
            day,
            state,
            counters,
            tracker: None,
            last_feedback: None,
            sets_completed: 0,
            pending_completion: None,
            completion_emitted: false,
        };
        controller.start_set();

        tracing::debug!(
            session = %controller.id,
            day = %controller.day.day_id,
            exercises = controller.day.exercises.len(),
            status = ?controller.state.status(),
            "Workout session started"
        );

        Ok(controller)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn day(&self) -> &WorkoutDay {
        &self.day
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished
    }

    pub fn current_exercise(&self) -> Option<&WorkoutDayExercise> {
        if self.state.is_finished {
            return None;
        }
        self.day.exercises.get(self.state.current_exercise_index)
    }

    pub fn complete_set(&mut self) -> Vec<SessionEvent> {
        let next = self.state.complete_set(&self.day.exercises);
        self.apply(next)
    }

    /// Called once per second by the host timer
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let next = self.state.tick();
        self.apply(next)
    }

    pub fn pause(&mut self) -> Vec<SessionEvent> {
        let next = self.state.pause();
        self.apply(next)
    }

    pub fn resume(&mut self) -> Vec<SessionEvent> {
        let next = self.state.resume();
        self.apply(next)
    }

    pub fn skip_rest(&mut self) -> Vec<SessionEvent> {
        let next = self.state.skip_rest();
        self.apply(next)
    }

    /// Feed one camera frame to the current exercise's counter.
    ///
    /// Returns `None` when the frame is not used: the session is resting,
    /// paused or finished, or the exercise has no camera counter. Reaching
    /// the set's rep target completes the set.
    pub fn observe_frame(&mut self, pose: &Pose) -> Option<FrameUpdate> {
        if self.status() != SessionStatus::Exercising {
            return None;
        }
        let tracker = self.tracker.as_mut()?;
        let observation = tracker.observe(pose);
        self.last_feedback = Some(observation.result.feedback.clone());

        let events = if observation.target_reached {
            tracing::debug!(
                session = %self.id,
                reps = observation.reps,
                "Rep target reached"
            );
            self.complete_set()
        } else {
            Vec::new()
        };

        Some(FrameUpdate {
            observation,
            events,
        })
    }

    /// Day-complete signal, handed out exactly once per session
    pub fn take_completion(&mut self) -> Option<DayCompletion> {
        self.pending_completion.take()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let exercise = self.current_exercise();
        let rest_period = exercise.map_or(0, |e| e.rest_period_seconds);
        let rest_progress = if self.state.is_resting && rest_period > 0 {
            self.state.rest_seconds_remaining as f64 / rest_period as f64
        } else {
            0.0
        };

        SessionSnapshot {
            session_id: self.id,
            day_id: self.day.day_id,
            status: self.state.status(),
            exercise_index: self.state.current_exercise_index,
            exercise_count: self.day.exercises.len(),
            exercise_id: exercise.map(|e| e.exercise_id),
            exercise_name: exercise.and_then(|e| e.name.clone()),
            current_set: self.state.current_set,
            total_sets: exercise.map_or(0, |e| e.sets),
            reps: exercise.map(|e| e.reps.clone()).unwrap_or_default(),
            reps_counted: self.tracker.as_ref().map(RepTracker::reps),
            phase: self.tracker.as_ref().map(RepTracker::phase),
            feedback: self.last_feedback.clone(),
            rest_seconds_remaining: self.state.rest_seconds_remaining,
            rest_progress,
            is_paused: self.state.is_paused,
            is_final_set: !self.state.is_finished && self.state.is_final_set(&self.day.exercises),
        }
    }

    /// Abandon the session. Nothing is persisted.
    pub fn stop(self) -> SessionSummary {
        if !self.state.is_finished {
            tracing::info!(
                session = %self.id,
                day = %self.day.day_id,
                sets_completed = self.sets_completed,
                "Workout session abandoned"
            );
        }
        self.summary()
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            day_id: self.day.day_id,
            sets_completed: self.sets_completed,
            finished: self.state.is_finished,
        }
    }

    fn apply(&mut self, transition: Transition) -> Vec<SessionEvent> {
        self.state = transition.state;

        for event in &transition.events {
            tracing::debug!(session = %self.id, ?event, "Session transition");

            match event {
                SessionEvent::SetCompleted { .. } => self.sets_completed += 1,
                SessionEvent::SetStarted { .. } => self.start_set(),
                SessionEvent::RestStarted { .. } => self.tracker = None,
                SessionEvent::Finished => self.finish(),
                _ => {}
            }
        }

        transition.events
    }

    fn start_set(&mut self) {
        self.last_feedback = None;
        self.tracker = self.current_exercise().and_then(|exercise| {
            let counter = self.counters[self.state.current_exercise_index].clone()?;
            Some(RepTracker::new(counter, exercise.rep_target()))
        });
    }

    fn finish(&mut self) {
        self.tracker = None;
        if self.completion_emitted {
            return;
        }
        self.completion_emitted = true;

        let completion = DayCompletion::now(self.day.day_id);
        tracing::info!(
            session = %self.id,
            day = %self.day.day_id,
            sets_completed = self.sets_completed,
            completed_at = %completion.completed_at,
            "Workout day complete"
        );
        self.pending_completion = Some(completion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repfit_core::{Keypoint, Landmark};
    use repfit_counter::{ExerciseKind, Feedback};

    fn day(exercises: Vec<WorkoutDayExercise>) -> WorkoutDay {
        WorkoutDay::new(DayId(42), exercises)
    }

    fn controller(exercises: Vec<WorkoutDayExercise>) -> WorkoutSessionController {
        WorkoutSessionController::new(day(exercises), &RepfitConfig::default()).unwrap()
    }

    /// Both elbows opened to `angle_deg`
    fn push_up_pose(angle_deg: f64) -> Pose {
        let rad = angle_deg.to_radians();
        vec![
            Keypoint::at(Landmark::LeftElbow, 0.0, 0.0, 0.9),
            Keypoint::at(Landmark::LeftShoulder, 1.0, 0.0, 0.9),
            Keypoint::at(Landmark::LeftWrist, rad.cos(), rad.sin(), 0.9),
            Keypoint::at(Landmark::RightElbow, 5.0, 0.0, 0.9),
            Keypoint::at(Landmark::RightShoulder, 6.0, 0.0, 0.9),
            Keypoint::at(Landmark::RightWrist, 5.0 + rad.cos(), rad.sin(), 0.9),
        ]
        .into_iter()
        .collect()
    }

    fn do_rep(session: &mut WorkoutSessionController) -> Vec<FrameUpdate> {
        [80.0, 170.0]
            .into_iter()
            .filter_map(|angle| session.observe_frame(&push_up_pose(angle)))
            .collect()
    }

    #[test]
    fn test_two_set_session_emits_one_completion() {
        let mut session = controller(vec![WorkoutDayExercise::new(1, 2, "12", 30)]);
        assert_eq!(session.status(), SessionStatus::Exercising);

        session.complete_set();
        let snap = session.snapshot();
        assert_eq!(snap.status, SessionStatus::Resting);
        assert_eq!((snap.exercise_index, snap.current_set), (0, 1));
        assert_eq!(snap.rest_seconds_remaining, 30);
        assert_eq!(snap.rest_progress, 1.0);

        for _ in 0..30 {
            session.tick();
        }
        let snap = session.snapshot();
        assert_eq!(snap.status, SessionStatus::Exercising);
        assert_eq!((snap.exercise_index, snap.current_set), (0, 2));
        assert!(snap.is_final_set);
        assert!(session.take_completion().is_none());

        let events = session.complete_set();
        assert!(events.contains(&SessionEvent::Finished));
        assert!(session.is_finished());

        let completion = session.take_completion().unwrap();
        assert_eq!(completion.day_id, DayId(42));
        assert!(session.take_completion().is_none());

        // Late calls from the host are harmless
        session.tick();
        session.complete_set();
        session.skip_rest();
        assert!(session.take_completion().is_none());

        let summary = session.stop();
        assert_eq!(summary.sets_completed, 2);
        assert!(summary.finished);
    }

    #[test]
    fn test_rest_progress_fraction() {
        let mut session = controller(vec![WorkoutDayExercise::new(1, 2, "12", 10)]);
        session.complete_set();
        for _ in 0..4 {
            session.tick();
        }
        let snap = session.snapshot();
        assert_eq!(snap.rest_seconds_remaining, 6);
        assert!((snap.rest_progress - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_camera_counted_set_completes_at_target() {
        let mut session = controller(vec![
            WorkoutDayExercise::new(1, 2, "3", 20).with_counter(ExerciseKind::PushUp),
        ]);
        assert_eq!(session.snapshot().phase, Some(RepPhase::Up));

        do_rep(&mut session);
        do_rep(&mut session);
        let snap = session.snapshot();
        assert_eq!(snap.reps_counted, Some(2));
        assert_eq!(snap.status, SessionStatus::Exercising);

        let updates = do_rep(&mut session);
        let last = updates.last().unwrap();
        assert!(last.observation.target_reached);
        assert!(last.events.contains(&SessionEvent::RestStarted { seconds: 20 }));
        assert_eq!(session.status(), SessionStatus::Resting);

        // Frames during rest are ignored
        assert!(session.observe_frame(&push_up_pose(80.0)).is_none());

        session.skip_rest();
        let snap = session.snapshot();
        assert_eq!(snap.current_set, 2);
        assert_eq!(snap.reps_counted, Some(0));
        assert_eq!(snap.phase, Some(RepPhase::Up));
        assert!(snap.feedback.is_none());
    }

    #[test]
    fn test_open_target_needs_manual_completion() {
        let mut session = controller(vec![
            WorkoutDayExercise::new(1, 1, "AMRAP", 20).with_counter(ExerciseKind::PushUp),
        ]);
        for _ in 0..25 {
            do_rep(&mut session);
        }
        assert_eq!(session.snapshot().reps_counted, Some(25));
        assert_eq!(session.status(), SessionStatus::Exercising);

        session.complete_set();
        assert!(session.is_finished());
        assert!(session.take_completion().is_some());
    }

    #[test]
    fn test_frames_ignored_without_counter() {
        let mut session = controller(vec![WorkoutDayExercise::new(1, 1, "10", 20)]);
        assert!(session.observe_frame(&push_up_pose(80.0)).is_none());
        assert_eq!(session.snapshot().reps_counted, None);
    }

    #[test]
    fn test_feedback_surfaces_in_snapshot() {
        let mut session = controller(vec![
            WorkoutDayExercise::new(1, 1, "10", 20).with_counter(ExerciseKind::PushUp),
        ]);
        let update = session.observe_frame(&Pose::default()).unwrap();
        assert!(update.observation.result.is_rejected());
        assert_eq!(
            session.snapshot().feedback,
            Some(
                Feedback::LimbsNotVisible {
                    limbs: repfit_counter::TrackedLimbs::Arms
                }
                .to_string()
            )
        );
    }

    #[test]
    fn test_counter_switches_with_exercise() {
        let mut session = controller(vec![
            WorkoutDayExercise::new(1, 1, "1", 5)
                .with_counter(ExerciseKind::PushUp)
                .with_order(0),
            WorkoutDayExercise::new(2, 1, "10", 15)
                .with_counter(ExerciseKind::Squat)
                .with_order(1),
        ]);

        do_rep(&mut session);
        assert_eq!(session.status(), SessionStatus::Resting);
        assert_eq!(session.snapshot().rest_seconds_remaining, 15);
        assert_eq!(session.snapshot().exercise_id, Some(2));

        session.skip_rest();
        // Push-up frames no longer count: the squat counter needs legs
        let update = session.observe_frame(&push_up_pose(80.0)).unwrap();
        assert!(update.observation.result.is_rejected());
    }

    #[test]
    fn test_stop_mid_session_persists_nothing() {
        let mut session = controller(vec![WorkoutDayExercise::new(1, 3, "10", 30)]);
        session.complete_set();
        session.pause();
        assert_eq!(session.status(), SessionStatus::Paused);
        assert!(session.take_completion().is_none());

        let summary = session.stop();
        assert_eq!(summary.sets_completed, 1);
        assert!(!summary.finished);
    }

    #[test]
    fn test_empty_day_is_finished_without_completion() {
        let mut session = controller(Vec::new());
        assert!(session.is_finished());
        assert!(session.current_exercise().is_none());
        assert!(session.complete_set().is_empty());
        assert!(session.take_completion().is_none());

        let snap = session.snapshot();
        assert_eq!(snap.status, SessionStatus::Finished);
        assert!(!snap.is_final_set);
    }

    #[test]
    fn test_invalid_counter_config_rejected() {
        let mut config = RepfitConfig::default();
        config.counter.push_up.min_confidence = 2.0;
        let day = day(vec![
            WorkoutDayExercise::new(1, 1, "10", 20).with_counter(ExerciseKind::PushUp),
        ]);
        assert!(WorkoutSessionController::new(day, &config).is_err());
    }
}
