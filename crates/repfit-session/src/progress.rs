//! Hand-off of finished workout days to the progress-tracking service.

use async_trait::async_trait;
use parking_lot::Mutex;
use repfit_core::{DayId, Timestamp};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Result type for progress-tracking operations
pub type ProgressResult<T> = Result<T, ProgressError>;

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("Progress service unavailable: {0}")]
    Unavailable(String),

    #[error("Progress service rejected day {day_id}: {reason}")]
    Rejected { day_id: DayId, reason: String },
}

/// "Mark this day complete for the current user"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCompletion {
    pub day_id: DayId,
    pub completed_at: Timestamp,
}

impl DayCompletion {
    pub fn now(day_id: DayId) -> Self {
        Self {
            day_id,
            completed_at: Timestamp::now(),
        }
    }
}

/// Collaborator that persists completed days.
///
/// Calls are fire-and-forget from the session's point of view; retrying or
/// surfacing a failure to the user is up to the implementation or its host.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    async fn mark_day_complete(&self, completion: DayCompletion) -> ProgressResult<()>;
}

/// Keeps completions in memory
#[derive(Debug, Default)]
pub struct InMemoryProgressTracker {
    completions: Mutex<Vec<DayCompletion>>,
}

impl InMemoryProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completions(&self) -> Vec<DayCompletion> {
        self.completions.lock().clone()
    }

    pub fn is_complete(&self, day_id: DayId) -> bool {
        self.completions.lock().iter().any(|c| c.day_id == day_id)
    }
}

#[async_trait]
impl ProgressTracker for InMemoryProgressTracker {
    async fn mark_day_complete(&self, completion: DayCompletion) -> ProgressResult<()> {
        self.completions.lock().push(completion);
        Ok(())
    }
}

/// Forwards completions to whichever task owns persistence
#[derive(Debug, Clone)]
pub struct ChannelProgressTracker {
    tx: mpsc::UnboundedSender<DayCompletion>,
}

impl ChannelProgressTracker {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DayCompletion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ProgressTracker for ChannelProgressTracker {
    async fn mark_day_complete(&self, completion: DayCompletion) -> ProgressResult<()> {
        self.tx
            .send(completion)
            .map_err(|_| ProgressError::Unavailable("completion receiver dropped".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_tracker_records() {
        let tracker = InMemoryProgressTracker::new();
        tracker
            .mark_day_complete(DayCompletion::now(DayId(4)))
            .await
            .unwrap();

        assert!(tracker.is_complete(DayId(4)));
        assert!(!tracker.is_complete(DayId(5)));
        assert_eq!(tracker.completions().len(), 1);
    }

    #[tokio::test]
    async fn test_channel_tracker_forwards_and_reports_drop() {
        let (tracker, mut rx) = ChannelProgressTracker::new();
        let completion = DayCompletion::now(DayId(9));

        tracker.mark_day_complete(completion).await.unwrap();
        assert_eq!(rx.recv().await, Some(completion));

        drop(rx);
        let result = tracker.mark_day_complete(completion).await;
        assert!(matches!(result, Err(ProgressError::Unavailable(_))));
    }

    #[test]
    fn test_error_display() {
        let err = ProgressError::Rejected {
            day_id: DayId(3),
            reason: "already completed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Progress service rejected day 3: already completed"
        );
    }
}
