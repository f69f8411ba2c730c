//! Single-episode evaluation
//!
//! This module covers one candidate's run through the level:
//! - Grid sensing around the agent
//! - Decoding network outputs into actions
//! - Visited-state tracking and stagnation detection
//! - The per-frame runner and episode classification
//! - Fitness scoring of the finished episode

mod actions;
mod fitness;
mod runner;
mod sensors;
mod visits;

pub use actions::{
    ActionDecoder, ActionFlags, ActivationRange, ChannelActivations, DecoderConfig, Facing,
    OutputChannel,
};
pub use fitness::{FitnessBreakdown, FitnessConfig, FitnessDiagnostics, FitnessEvaluator};
pub use runner::{
    EpisodePhase, EpisodeRunner, EpisodeState, EpisodeSummary, FrameOutcome, RunStatus,
};
pub use sensors::{GridSensor, SensorConfig, MAX_SENSOR_RADIUS, SENSOR_BIAS};
pub use visits::{FrameActivity, TrackerConfig, VisitTracker};
