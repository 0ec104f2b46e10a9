//! Hysteresis thresholds and confidence gating.

use repfit_core::{Keypoint, Result, ThresholdConfig};
use serde::{Deserialize, Serialize};

/// Classification of an averaged joint angle against the hysteresis band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimbPosture {
    /// Below the down threshold
    Flexed,
    /// Above the up threshold
    Extended,
    /// Between the two thresholds (inclusive of both edges)
    DeadZone,
}

/// Validated exercise-class constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    down_below_deg: f64,
    up_above_deg: f64,
    min_confidence: f64,
}

impl Thresholds {
    pub fn new(config: ThresholdConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            down_below_deg: config.down_below_deg,
            up_above_deg: config.up_above_deg,
            min_confidence: config.min_confidence,
        })
    }

    pub fn down_below_deg(&self) -> f64 {
        self.down_below_deg
    }

    pub fn up_above_deg(&self) -> f64 {
        self.up_above_deg
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    pub fn classify(&self, angle_deg: f64) -> LimbPosture {
        if angle_deg < self.down_below_deg {
            LimbPosture::Flexed
        } else if angle_deg > self.up_above_deg {
            LimbPosture::Extended
        } else {
            LimbPosture::DeadZone
        }
    }

    /// Low-confidence keypoints jitter enough to fake phase changes, so they are never used.
    pub fn is_confident(&self, keypoint: &Keypoint) -> bool {
        keypoint.score > self.min_confidence
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        let config = ThresholdConfig::default();
        Self {
            down_below_deg: config.down_below_deg,
            up_above_deg: config.up_above_deg,
            min_confidence: config.min_confidence,
        }
    }
}

impl From<Thresholds> for ThresholdConfig {
    fn from(t: Thresholds) -> Self {
        Self {
            down_below_deg: t.down_below_deg,
            up_above_deg: t.up_above_deg,
            min_confidence: t.min_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_band_edges() {
        let t = Thresholds::default();
        assert_eq!(t.classify(89.9), LimbPosture::Flexed);
        assert_eq!(t.classify(90.0), LimbPosture::DeadZone);
        assert_eq!(t.classify(125.0), LimbPosture::DeadZone);
        assert_eq!(t.classify(160.0), LimbPosture::DeadZone);
        assert_eq!(t.classify(160.1), LimbPosture::Extended);
    }

    #[test]
    fn test_confidence_floor_is_exclusive() {
        let t = Thresholds::default();
        assert!(!t.is_confident(&Keypoint::new("left_knee", 0.0, 0.0, 0.5)));
        assert!(t.is_confident(&Keypoint::new("left_knee", 0.0, 0.0, 0.51)));
        assert!(!t.is_confident(&Keypoint::new("left_knee", 0.0, 0.0, f64::NAN)));
    }

    #[test]
    fn test_custom_thresholds_validated() {
        let tuned = ThresholdConfig {
            down_below_deg: 100.0,
            up_above_deg: 150.0,
            min_confidence: 0.3,
        };
        let t = Thresholds::new(tuned).unwrap();
        assert_eq!(t.classify(95.0), LimbPosture::Flexed);
        assert_eq!(ThresholdConfig::from(t), tuned);

        let inverted = ThresholdConfig {
            down_below_deg: 150.0,
            up_above_deg: 100.0,
            ..tuned
        };
        assert!(Thresholds::new(inverted).is_err());
    }
}
