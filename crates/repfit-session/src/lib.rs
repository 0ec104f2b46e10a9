//! # Repfit-Session
//!
//! Workout-session state machine for one user working through a plan day.
//!
//! ## Flow
//!
//! ```text
//! pose frames ──▶ RepTracker ──target reached──┐
//!                                              ▼
//! user "set done" ─────────────────────▶ complete_set ──▶ rest countdown ──▶ next set
//!                                              │            (tick, pause,
//!                                              │             resume, skip)
//!                                              ▼
//!                                  Finished ──▶ ProgressTracker
//! ```
//!
//! [`SessionState`] transitions are pure functions over values;
//! [`WorkoutSessionController`] owns the single live state for a session and
//! [`SessionDriver`] hosts it on a tokio task with a 1 Hz rest timer.

pub mod controller;
pub mod driver;
pub mod plan;
pub mod progress;
pub mod state;

pub use controller::*;
pub use driver::*;
pub use plan::*;
pub use progress::*;
pub use state::*;
