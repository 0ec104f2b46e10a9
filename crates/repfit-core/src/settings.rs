//! Layered configuration: built-in defaults, optional file, `REPFIT_*` environment.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const ENV_PREFIX: &str = "REPFIT";

/// Complete repfit configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepfitConfig {
    /// Per-exercise counter tuning
    pub counter: CounterConfig,

    /// Host-side session scheduling
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub push_up: ThresholdConfig,
    pub squat: ThresholdConfig,
}

/// Joint-angle hysteresis band and keypoint confidence floor for one exercise class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Averaged joint angle below which the limb counts as flexed (degrees)
    pub down_below_deg: f64,

    /// Averaged joint angle above which the limb counts as extended (degrees)
    pub up_above_deg: f64,

    /// Keypoints must score strictly above this to be used
    pub min_confidence: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            down_below_deg: 90.0,
            up_above_deg: 160.0,
            min_confidence: 0.5,
        }
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<()> {
        let in_range = |deg: f64| (0.0..=180.0).contains(&deg);

        if !in_range(self.down_below_deg) || !in_range(self.up_above_deg) {
            return Err(Error::InvalidThresholds(format!(
                "angles must lie in [0, 180], got down={} up={}",
                self.down_below_deg, self.up_above_deg
            )));
        }
        if self.down_below_deg >= self.up_above_deg {
            return Err(Error::InvalidThresholds(format!(
                "down threshold {} must be below up threshold {}",
                self.down_below_deg, self.up_above_deg
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::InvalidThresholds(format!(
                "confidence floor must lie in [0, 1], got {}",
                self.min_confidence
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Rest countdown tick period (milliseconds)
    pub tick_interval_ms: u64,

    /// Capacity of the host command queue
    pub command_queue_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            command_queue_size: 64,
        }
    }
}

impl RepfitConfig {
    /// Load configuration from file, with environment overrides
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path))
            .add_source(environment())
            .build()?;

        Self::finish(settings)
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(environment())
            .build()?;

        Self::finish(settings)
    }

    /// Parse an inline TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from_str(toml, ::config::FileFormat::Toml))
            .build()?;

        Self::finish(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.counter.push_up.validate()?;
        self.counter.squat.validate()?;
        if self.session.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be positive".to_string()));
        }
        if self.session.command_queue_size == 0 {
            return Err(Error::Config("command_queue_size must be positive".to_string()));
        }
        Ok(())
    }

    fn finish(settings: ::config::Config) -> Result<Self> {
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

fn environment() -> ::config::Environment {
    ::config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RepfitConfig::default();
        assert_eq!(config.counter.push_up.down_below_deg, 90.0);
        assert_eq!(config.counter.squat.up_above_deg, 160.0);
        assert_eq!(config.counter.squat.min_confidence, 0.5);
        assert_eq!(config.session.tick_interval_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RepfitConfig::from_toml_str(
            r#"
            [counter.squat]
            down_below_deg = 100.0

            [session]
            tick_interval_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.counter.squat.down_below_deg, 100.0);
        assert_eq!(config.counter.squat.up_above_deg, 160.0);
        assert_eq!(config.counter.push_up, ThresholdConfig::default());
        assert_eq!(config.session.tick_interval_ms, 500);
        assert_eq!(config.session.command_queue_size, 64);
    }

    #[test]
    fn test_inverted_band_rejected() {
        let result = RepfitConfig::from_toml_str(
            r#"
            [counter.push_up]
            down_below_deg = 170.0
            up_above_deg = 160.0
            "#,
        );
        assert!(matches!(result, Err(Error::InvalidThresholds(_))));
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        let thresholds = ThresholdConfig {
            min_confidence: 1.5,
            ..Default::default()
        };
        assert!(thresholds.validate().is_err());
    }

    /// Environment overrides are process-global, so every case that reads
    /// `REPFIT_*` variables runs inside this one test.
    #[test]
    fn test_environment_overrides() {
        use std::io::Write;

        let vars = [
            ("REPFIT_COUNTER__PUSH_UP__DOWN_BELOW_DEG", "100"),
            ("REPFIT_SESSION__TICK_INTERVAL_MS", "250"),
        ];
        for (key, value) in vars {
            std::env::set_var(key, value);
        }

        let config = RepfitConfig::from_env().unwrap();
        assert_eq!(config.counter.push_up.down_below_deg, 100.0);
        assert_eq!(config.counter.push_up.up_above_deg, 160.0);
        assert_eq!(config.counter.squat, ThresholdConfig::default());
        assert_eq!(config.session.tick_interval_ms, 250);

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[counter.push_up]\ndown_below_deg = 80.0\nup_above_deg = 150.0\n\n\
             [session]\ntick_interval_ms = 2000\ncommand_queue_size = 16"
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        // File values apply, environment wins where both are set
        let config = RepfitConfig::from_file(path).unwrap();
        assert_eq!(config.counter.push_up.down_below_deg, 100.0);
        assert_eq!(config.counter.push_up.up_above_deg, 150.0);
        assert_eq!(config.session.tick_interval_ms, 250);
        assert_eq!(config.session.command_queue_size, 16);

        std::env::set_var("REPFIT_COUNTER__PUSH_UP__DOWN_BELOW_DEG", "155");
        assert!(matches!(
            RepfitConfig::from_file(path),
            Err(Error::InvalidThresholds(_))
        ));

        for (key, _) in vars {
            std::env::remove_var(key);
        }
        let config = RepfitConfig::from_file(path).unwrap();
        assert_eq!(config.counter.push_up.down_below_deg, 80.0);
        assert_eq!(config.session.tick_interval_ms, 2000);
    }

    #[test]
    fn test_zero_tick_rejected() {
        let mut config = RepfitConfig::default();
        config.session.tick_interval_ms = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
