//! # Repfit-Core
//!
//! Core types and utilities for the repfit exercise-tracking system:
//! pose keypoints as produced by a single-person pose estimator, the
//! joint-angle geometry the repetition counters are built on, and the
//! layered configuration shared by every crate in the workspace.

pub mod error;
pub mod geometry;
pub mod settings;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use settings::*;
pub use types::*;
