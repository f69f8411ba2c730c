//! Experiment configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. A RON file (`spelunker.ron` in the working directory if present, or an explicit path)
//! 3. Environment variables prefixed with `SPELUNKER_`
//!
//! Example environment variable: `SPELUNKER_TRACKER__MAX_IDLE_TIME=3.5`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::episode::{DecoderConfig, FitnessConfig, GridSensor, SensorConfig, TrackerConfig};
use crate::error::SetupError;

/// Complete configuration of an evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub sensor: SensorConfig,

    #[serde(default)]
    pub decoder: DecoderConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub fitness: FitnessConfig,

    #[serde(default)]
    pub experiment: RunSettings,
}

/// Run-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Seed for the random source handed to the evolution engine
    pub seed: u64,
    /// Directory receiving one population snapshot per generation
    pub snapshot_dir: PathBuf,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            seed: 12345,
            snapshot_dir: PathBuf::from("genomes"),
        }
    }
}

impl RunSettings {
    /// Snapshot path for a generation: `<snapshot_dir>/gen_<generation>.pop`
    pub fn snapshot_path(&self, generation: u32) -> PathBuf {
        self.snapshot_dir.join(format!("gen_{generation}.pop"))
    }
}

impl ExperimentConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `path` if given (must exist), otherwise `spelunker.ron` if it exists
    /// 3. Environment variables prefixed with `SPELUNKER_` (highest priority)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Ron).required(true),
            None => File::with_name("spelunker")
                .format(FileFormat::Ron)
                .required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("SPELUNKER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Check every section for values the harness cannot run with
    pub fn validate(&self) -> Result<(), SetupError> {
        GridSensor::new(&self.sensor)?;
        let bounds = &self.sensor.bounds;
        if bounds.min_x > bounds.max_x || bounds.min_y > bounds.max_y {
            return Err(SetupError::InvalidParameter {
                name: "bounds",
                reason: format!("empty level bounds {bounds:?}"),
            });
        }
        if self.tracker.max_idle_time.is_nan() || self.tracker.max_idle_time <= 0.0 {
            return Err(SetupError::InvalidParameter {
                name: "max_idle_time",
                reason: format!("must be positive, got {}", self.tracker.max_idle_time),
            });
        }
        self.decoder.validate()?;
        self.fitness.validate()?;
        Ok(())
    }

    /// Pretty RON rendering of the effective configuration
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize configuration")
    }
}
