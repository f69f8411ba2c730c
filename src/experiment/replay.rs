//! Offline replay of recorded episodes
//!
//! A trace file holds an ASCII level and, per candidate, the frames a live
//! run produced: where the agent stood, the episode clock and the raw network
//! outputs. Replaying drives the full controller lifecycle over those frames,
//! so scoring and generation bookkeeping can be checked without a game.

use std::path::Path;

use anyhow::{Context, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::controller::{EpisodeReport, ExperimentController};
use super::stats::GenerationStats;
use crate::config::ExperimentConfig;
use crate::episode::{GridSensor, OutputChannel};
use crate::level::{Position, TileMap};
use crate::traits::{Candidate, DecisionNetwork, Environment, Population};

/// One recorded frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFrame {
    pub x: i32,
    pub y: i32,
    /// Seconds since the episode started
    pub time: f32,
    pub outputs: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EpisodeTrace {
    pub frames: Vec<TraceFrame>,
}

/// Recorded run: one episode per candidate, in population order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFile {
    /// Level drawn with tile glyphs, one row per line
    pub level: String,
    pub time_budget: f32,
    pub episodes: Vec<EpisodeTrace>,
}

impl TraceFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace file {:?}", path))?;
        ron::from_str(&text).with_context(|| format!("Failed to parse trace file {:?}", path))
    }
}

/// Network that plays back recorded outputs, one frame per activation
#[derive(Debug, Clone)]
pub struct ReplayNetwork {
    input_len: usize,
    output_len: usize,
    frames: Vec<Vec<f32>>,
    next: usize,
    current: Vec<f32>,
}

impl ReplayNetwork {
    pub fn new(input_len: usize, trace: &EpisodeTrace) -> Self {
        let frames: Vec<Vec<f32>> = trace.frames.iter().map(|f| f.outputs.clone()).collect();
        let output_len = frames
            .iter()
            .map(Vec::len)
            .min()
            .unwrap_or(OutputChannel::COUNT);
        Self {
            input_len,
            output_len,
            frames,
            next: 0,
            current: Vec::new(),
        }
    }

    /// Start playback from the first recorded frame again
    pub fn rewind(&mut self) {
        self.next = 0;
        self.current.clear();
    }
}

impl DecisionNetwork for ReplayNetwork {
    fn input_len(&self) -> usize {
        self.input_len
    }

    fn output_len(&self) -> usize {
        self.output_len
    }

    /// Recorded outputs already reflect what the agent saw
    fn load_sensors(&mut self, _values: &[f32]) {}

    fn activate(&mut self) {
        self.current = self.frames.get(self.next).cloned().unwrap_or_default();
        self.next += 1;
    }

    fn outputs(&self) -> Vec<f32> {
        self.current.clone()
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCandidate {
    network: ReplayNetwork,
    fitness: f32,
    winner: bool,
}

impl Candidate for RecordedCandidate {
    type Network = ReplayNetwork;

    fn network(&self) -> &ReplayNetwork {
        &self.network
    }

    fn network_mut(&mut self) -> &mut ReplayNetwork {
        &mut self.network
    }

    fn fitness(&self) -> f32 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    fn is_winner(&self) -> bool {
        self.winner
    }

    fn set_winner(&mut self, winner: bool) {
        self.winner = winner;
    }
}

/// Snapshot row written for each candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSnapshot {
    pub index: usize,
    pub fitness: f32,
    pub winner: bool,
}

/// Population of recorded candidates
///
/// There is nothing to evolve, so an epoch only clears scores and rewinds
/// playback.
#[derive(Debug, Clone, Default)]
pub struct RecordedPopulation {
    candidates: Vec<RecordedCandidate>,
}

impl RecordedPopulation {
    pub fn from_traces(input_len: usize, traces: &[EpisodeTrace]) -> Self {
        Self {
            candidates: traces
                .iter()
                .map(|trace| RecordedCandidate {
                    network: ReplayNetwork::new(input_len, trace),
                    fitness: 0.0,
                    winner: false,
                })
                .collect(),
        }
    }

    pub fn snapshot(&self) -> Vec<CandidateSnapshot> {
        self.candidates
            .iter()
            .enumerate()
            .map(|(index, c)| CandidateSnapshot {
                index,
                fitness: c.fitness,
                winner: c.winner,
            })
            .collect()
    }
}

impl Population for RecordedPopulation {
    type Candidate = RecordedCandidate;

    fn len(&self) -> usize {
        self.candidates.len()
    }

    fn candidate(&self, index: usize) -> Option<&RecordedCandidate> {
        self.candidates.get(index)
    }

    fn candidate_mut(&mut self, index: usize) -> Option<&mut RecordedCandidate> {
        self.candidates.get_mut(index)
    }

    fn epoch(&mut self, generation: u32, _rng: &mut dyn RngCore) -> Result<()> {
        log::debug!("Recorded population epoch after generation {}", generation);
        for candidate in &mut self.candidates {
            candidate.fitness = 0.0;
            candidate.winner = false;
            candidate.network.rewind();
        }
        Ok(())
    }

    fn persist(&self, path: &Path) -> Result<()> {
        let data = ron::ser::to_string_pretty(&self.snapshot(), ron::ser::PrettyConfig::default())
            .context("Failed to serialize population snapshot")?;
        std::fs::write(path, data).context("Failed to write population snapshot")?;
        Ok(())
    }
}

/// Game-side view backed by a parsed level and the current trace frame
pub struct ReplayEnvironment<'a> {
    map: &'a TileMap,
    position: Position,
    time: f32,
    time_budget: f32,
}

impl<'a> ReplayEnvironment<'a> {
    /// Starts at the level entrance, or the origin if the level has none
    pub fn new(map: &'a TileMap, time_budget: f32) -> Self {
        Self {
            map,
            position: map.entrance().unwrap_or(Position::new(0, 0)),
            time: 0.0,
            time_budget,
        }
    }

    pub fn advance(&mut self, frame: &TraceFrame) {
        self.position = Position::new(frame.x, frame.y);
        self.time = frame.time;
    }
}

impl Environment for ReplayEnvironment<'_> {
    fn tile_at(&self, x: i32, y: i32) -> i32 {
        self.map.tile_at(x, y)
    }

    fn player_position(&self) -> Position {
        self.position
    }

    fn elapsed_episode_time(&self) -> f32 {
        self.time
    }

    fn episode_time_budget(&self) -> f32 {
        self.time_budget
    }
}

/// Everything a replay produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayOutcome {
    pub reports: Vec<EpisodeReport>,
    pub history: Vec<GenerationStats>,
}

/// Replay every recorded episode as one generation
///
/// An episode ends on the first frame that requests termination, or when
/// its frames run out.
pub fn replay_traces(config: &ExperimentConfig, trace: &TraceFile) -> Result<ReplayOutcome> {
    let map = TileMap::parse(&trace.level).context("Failed to parse trace level")?;
    let input_len = GridSensor::new(&config.sensor)?.input_len();
    let population = RecordedPopulation::from_traces(input_len, &trace.episodes);
    let mut controller = ExperimentController::new(config, population)?;

    log::info!(
        "Replaying {} episodes on a {}x{} level",
        trace.episodes.len(),
        map.width(),
        map.height()
    );

    let mut reports = Vec::with_capacity(trace.episodes.len());
    for episode in &trace.episodes {
        let mut env = ReplayEnvironment::new(&map, trace.time_budget);
        for frame in &episode.frames {
            env.advance(frame);
            if controller.frame(&env)?.should_terminate {
                break;
            }
        }
        reports.push(controller.end_episode(&env)?);
    }

    Ok(ReplayOutcome {
        reports,
        history: controller.history().to_vec(),
    })
}
