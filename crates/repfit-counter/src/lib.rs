//! # Repfit-Counter
//!
//! Camera-based repetition counting from 2-D pose keypoints.
//!
//! ## Algorithm
//!
//! For every frame the counter for an exercise:
//!
//! 1. Selects its joint triplet on both sides of the body
//!    (shoulder-elbow-wrist for push-ups, hip-knee-ankle for squats)
//! 2. Rejects the frame if any of those keypoints is missing or not confident
//! 3. Measures the interior angle at the middle joint on each side and averages them
//! 4. Classifies the angle against a hysteresis band (flexed below 90°,
//!    extended above 160° by default) and advances the rep phase
//!
//! ```text
//!   Up ──flexed──▶ Down ──extended──▶ Up   (+1 rep)
//!    ▲                                 │
//!    └───────── dead zone: hold ───────┘
//! ```
//!
//! Counters are pure; the phase lives with the caller, or in a [`RepTracker`]
//! which also counts reps toward a [`RepTarget`].

pub mod exercise;
pub mod phase;
pub mod target;
pub mod thresholds;
pub mod tracker;

pub use exercise::*;
pub use phase::*;
pub use target::*;
pub use thresholds::*;
pub use tracker::*;
