//! # Spelunker - Episodic Evaluation Harness for Evolved Tile-Level Agents
//!
//! Connects a neuro-evolution engine to a 2D tile-based game level. Each
//! candidate network plays one episode: it senses the tiles around the
//! agent, its outputs are decoded into movement actions, and the finished
//! episode is scored from distance, exploration and elapsed time. After the
//! last candidate of a generation the population is snapshotted and handed
//! back to the engine for its epoch.

pub mod config;
pub mod episode;
pub mod error;
pub mod experiment;
pub mod level;
pub mod traits;

pub use config::ExperimentConfig;
pub use error::{ExperimentError, SetupError};
pub use experiment::{EpisodeReport, ExperimentController};

/// Common imports for harness integrations
pub mod prelude {
    pub use crate::config::{ExperimentConfig, RunSettings};
    pub use crate::episode::{
        ActionFlags, EpisodeRunner, EpisodeSummary, FitnessBreakdown, FitnessEvaluator,
        FrameOutcome, GridSensor, RunStatus,
    };
    pub use crate::error::{ExperimentError, SetupError};
    pub use crate::experiment::{EpisodeReport, ExperimentController, GenerationStats};
    pub use crate::level::{Position, Tile, TileMap};
    pub use crate::traits::{Candidate, DecisionNetwork, Environment, Population};
}
