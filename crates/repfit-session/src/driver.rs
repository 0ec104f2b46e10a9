//! Tokio host for a session: one task owns the controller and serializes
//! camera frames, user commands and the rest-timer tick.

use std::sync::Arc;
use std::time::Duration;

use repfit_core::{Pose, SessionConfig};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::controller::{SessionSnapshot, SessionSummary, WorkoutSessionController};
use crate::progress::{DayCompletion, ProgressTracker};
use crate::state::SessionEvent;

/// Inputs the host forwards to a running session
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Frame(Pose),
    CompleteSet,
    Pause,
    Resume,
    SkipRest,
    Stop,
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Session has ended")]
    SessionClosed,

    #[error("Session task failed: {0}")]
    Join(String),
}

/// Handle to a session running on its own task
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<SessionSummary>,
}

impl SessionHandle {
    pub async fn send(&self, command: SessionCommand) -> Result<(), DriverError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| DriverError::SessionClosed)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Wait for the session to finish or be stopped
    pub async fn join(self) -> Result<SessionSummary, DriverError> {
        drop(self.commands);
        self.task
            .await
            .map_err(|e| DriverError::Join(e.to_string()))
    }
}

pub struct SessionDriver;

impl SessionDriver {
    /// Run `controller` on a new task until it finishes or receives `Stop`.
    ///
    /// Dropping every command sender also ends the session, as an abandonment.
    pub fn spawn(
        controller: WorkoutSessionController,
        progress: Arc<dyn ProgressTracker>,
        config: &SessionConfig,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::channel(config.command_queue_size);
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());
        let period = Duration::from_millis(config.tick_interval_ms);

        let task = tokio::spawn(run(controller, progress, rx, snapshot_tx, period));

        SessionHandle {
            commands: tx,
            snapshots: snapshot_rx,
            task,
        }
    }
}

async fn run(
    mut controller: WorkoutSessionController,
    progress: Arc<dyn ProgressTracker>,
    mut commands: mpsc::Receiver<SessionCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
    period: Duration,
) -> SessionSummary {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !controller.is_finished() {
        let events = tokio::select! {
            _ = ticker.tick() => controller.tick(),
            command = commands.recv() => match command {
                Some(SessionCommand::Frame(pose)) => controller
                    .observe_frame(&pose)
                    .map(|update| update.events)
                    .unwrap_or_default(),
                Some(SessionCommand::CompleteSet) => controller.complete_set(),
                Some(SessionCommand::Pause) => controller.pause(),
                Some(SessionCommand::Resume) => controller.resume(),
                Some(SessionCommand::SkipRest) => controller.skip_rest(),
                Some(SessionCommand::Stop) | None => break,
            },
        };

        // A fresh rest gets a full first second
        if events
            .iter()
            .any(|e| matches!(e, SessionEvent::RestStarted { .. } | SessionEvent::RestResumed))
        {
            ticker.reset();
        }

        if let Some(completion) = controller.take_completion() {
            dispatch_completion(progress.clone(), completion);
        }
        publish(&snapshots, controller.snapshot());
    }

    publish(&snapshots, controller.snapshot());
    if controller.is_finished() {
        controller.summary()
    } else {
        controller.stop()
    }
}

/// Notify subscribers only when the view actually changed; idle ticks
/// while exercising leave the snapshot untouched.
fn publish(snapshots: &watch::Sender<SessionSnapshot>, next: SessionSnapshot) {
    snapshots.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        *current = next;
        true
    });
}

/// Fire-and-forget: failures are logged, never retried here
fn dispatch_completion(progress: Arc<dyn ProgressTracker>, completion: DayCompletion) {
    tokio::spawn(async move {
        if let Err(e) = progress.mark_day_complete(completion).await {
            tracing::warn!(day = %completion.day_id, "Failed to record day completion: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{WorkoutDay, WorkoutDayExercise};
    use crate::progress::{ChannelProgressTracker, InMemoryProgressTracker};
    use crate::state::SessionStatus;
    use repfit_core::{DayId, RepfitConfig};

    fn controller(exercises: Vec<WorkoutDayExercise>) -> WorkoutSessionController {
        WorkoutSessionController::new(WorkoutDay::new(DayId(5), exercises), &RepfitConfig::default())
            .unwrap()
    }

    async fn wait_for(
        rx: &mut watch::Receiver<SessionSnapshot>,
        pred: impl Fn(&SessionSnapshot) -> bool,
    ) -> SessionSnapshot {
        rx.wait_for(|s| pred(s)).await.unwrap().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_rest_elapses_on_timer_and_completion_is_forwarded() {
        let (tracker, mut completions) = ChannelProgressTracker::new();
        let handle = SessionDriver::spawn(
            controller(vec![WorkoutDayExercise::new(1, 2, "10", 3)]),
            Arc::new(tracker),
            &SessionConfig::default(),
        );
        let mut rx = handle.subscribe();

        handle.send(SessionCommand::CompleteSet).await.unwrap();
        let snap = wait_for(&mut rx, |s| s.status == SessionStatus::Resting).await;
        assert_eq!(snap.rest_seconds_remaining, 3);

        let started = tokio::time::Instant::now();
        let snap = wait_for(&mut rx, |s| s.current_set == 2).await;
        assert_eq!(snap.status, SessionStatus::Exercising);
        assert!(started.elapsed() >= Duration::from_secs(3));

        handle.send(SessionCommand::CompleteSet).await.unwrap();
        let summary = handle.join().await.unwrap();
        assert!(summary.finished);
        assert_eq!(summary.sets_completed, 2);

        let completion = completions.recv().await.unwrap();
        assert_eq!(completion.day_id, DayId(5));
        assert!(completions.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_rest_does_not_elapse() {
        let handle = SessionDriver::spawn(
            controller(vec![WorkoutDayExercise::new(1, 2, "10", 5)]),
            Arc::new(InMemoryProgressTracker::new()),
            &SessionConfig::default(),
        );
        let mut rx = handle.subscribe();

        handle.send(SessionCommand::CompleteSet).await.unwrap();
        handle.send(SessionCommand::Pause).await.unwrap();
        wait_for(&mut rx, |s| s.is_paused).await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        let snap = handle.snapshot();
        assert_eq!(snap.status, SessionStatus::Paused);
        assert_eq!(snap.rest_seconds_remaining, 5);

        handle.send(SessionCommand::Resume).await.unwrap();
        let snap = wait_for(&mut rx, |s| s.rest_seconds_remaining == 4).await;
        assert_eq!(snap.status, SessionStatus::Resting);

        handle.send(SessionCommand::SkipRest).await.unwrap();
        let snap = wait_for(&mut rx, |s| s.status == SessionStatus::Exercising).await;
        assert_eq!(snap.current_set, 2);

        handle.send(SessionCommand::Stop).await.unwrap();
        let summary = handle.join().await.unwrap();
        assert!(!summary.finished);
        assert_eq!(summary.sets_completed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_ticks_publish_nothing() {
        let handle = SessionDriver::spawn(
            controller(vec![WorkoutDayExercise::new(1, 2, "10", 3)]),
            Arc::new(InMemoryProgressTracker::new()),
            &SessionConfig::default(),
        );
        let mut rx = handle.subscribe();
        rx.borrow_and_update();

        // Several timer periods pass while exercising
        tokio::time::sleep(Duration::from_millis(5500)).await;
        assert!(!rx.has_changed().unwrap());

        handle.send(SessionCommand::CompleteSet).await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().rest_seconds_remaining, 3);

        // Each rest second is published once
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().rest_seconds_remaining, 2);

        handle.send(SessionCommand::Stop).await.unwrap();
        handle.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_reports_nothing_to_progress() {
        let tracker = Arc::new(InMemoryProgressTracker::new());
        let handle = SessionDriver::spawn(
            controller(vec![WorkoutDayExercise::new(1, 1, "10", 5)]),
            tracker.clone(),
            &SessionConfig::default(),
        );

        handle.send(SessionCommand::Stop).await.unwrap();
        let summary = handle.join().await.unwrap();
        assert!(!summary.finished);
        assert!(tracker.completions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_exits_once_finished() {
        let handle = SessionDriver::spawn(
            controller(vec![WorkoutDayExercise::new(1, 1, "10", 5)]),
            Arc::new(InMemoryProgressTracker::new()),
            &SessionConfig::default(),
        );
        let mut rx = handle.subscribe();

        handle.send(SessionCommand::CompleteSet).await.unwrap();
        wait_for(&mut rx, |s| s.status == SessionStatus::Finished).await;

        let summary = handle.join().await.unwrap();
        assert!(summary.finished);
    }
}
