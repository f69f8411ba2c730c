//! Population-level experiment driving
//!
//! - [`ExperimentController`] walks the population one episode at a time
//! - [`GenerationStats`] summarizes each finished generation
//! - [`replay`] runs recorded traces through the full lifecycle

mod controller;
pub mod replay;
mod stats;

pub use controller::{EpisodeReport, ExperimentController};
pub use replay::{replay_traces, ReplayOutcome, TraceFile};
pub use stats::GenerationStats;
