//! Experiment controller: walks the population one episode at a time
//!
//! Each candidate gets exactly one episode. When the episode ends the
//! controller scores it, writes the fitness back to the candidate and moves
//! the cursor forward. After the last candidate it snapshots the population,
//! invokes the engine's epoch and starts the next generation from index 0.

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};

use super::stats::GenerationStats;
use crate::config::{ExperimentConfig, RunSettings};
use crate::episode::{
    EpisodeRunner, EpisodeSummary, FitnessBreakdown, FitnessEvaluator, FrameOutcome,
    OutputChannel,
};
use crate::error::{ExperimentError, SetupError};
use crate::traits::{Candidate, DecisionNetwork, Environment, Population};

/// Result of one finished episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeReport {
    pub generation: u32,
    pub candidate: usize,
    pub summary: EpisodeSummary,
    pub breakdown: FitnessBreakdown,
}

impl EpisodeReport {
    pub fn fitness(&self) -> f32 {
        self.breakdown.fitness
    }
}

/// Owns the evaluation cursor and generation counter for a population
pub struct ExperimentController<P: Population> {
    population: P,
    runner: EpisodeRunner,
    evaluator: FitnessEvaluator,
    settings: RunSettings,
    rng: Xoshiro256StarStar,
    cursor: usize,
    generation: u32,
    scores: Vec<(f32, bool)>,
    history: Vec<GenerationStats>,
    /// Scored episode whose generation rollover failed
    pending_rollover: Option<EpisodeReport>,
}

impl<P: Population> ExperimentController<P> {
    /// Validate the configuration and population, then bind to candidate 0
    pub fn new(config: &ExperimentConfig, population: P) -> Result<Self, ExperimentError> {
        config.validate()?;
        if population.is_empty() {
            return Err(SetupError::EmptyPopulation.into());
        }

        let runner = EpisodeRunner::new(
            &config.sensor,
            config.decoder.clone(),
            config.tracker.clone(),
        )?;
        let evaluator = FitnessEvaluator::new(config.fitness.clone())?;

        let inputs = runner.sensor().input_len();
        for index in 0..population.len() {
            let Some(candidate) = population.candidate(index) else {
                return Err(ExperimentError::CursorOutOfRange {
                    cursor: index,
                    len: population.len(),
                });
            };
            let network = candidate.network();
            if network.input_len() != inputs {
                return Err(SetupError::InputCountMismatch {
                    index,
                    expected: inputs,
                    actual: network.input_len(),
                }
                .into());
            }
            if network.output_len() < OutputChannel::COUNT {
                return Err(SetupError::OutputCountMismatch {
                    index,
                    expected: OutputChannel::COUNT,
                    actual: network.output_len(),
                }
                .into());
            }
        }

        log::info!(
            "Experiment ready: {} candidates, {} sensor inputs, seed {}",
            population.len(),
            inputs,
            config.experiment.seed
        );
        log::info!("Generation 0, candidate 0");

        Ok(Self {
            population,
            runner,
            evaluator,
            settings: config.experiment.clone(),
            rng: Xoshiro256StarStar::seed_from_u64(config.experiment.seed),
            cursor: 0,
            generation: 0,
            scores: Vec::new(),
            history: Vec::new(),
            pending_rollover: None,
        })
    }

    /// Index of the candidate currently being evaluated
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn population(&self) -> &P {
        &self.population
    }

    pub fn into_population(self) -> P {
        self.population
    }

    pub fn runner(&self) -> &EpisodeRunner {
        &self.runner
    }

    /// Summaries of every completed generation, oldest first
    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    /// Run one frame for the current candidate
    pub fn frame<E: Environment>(&mut self, env: &E) -> Result<FrameOutcome, ExperimentError> {
        let len = self.population.len();
        let candidate = self
            .population
            .candidate_mut(self.cursor)
            .ok_or(ExperimentError::CursorOutOfRange {
                cursor: self.cursor,
                len,
            })?;
        Ok(self.runner.step(env, candidate))
    }

    /// Score the finished episode and bind to the next candidate
    ///
    /// Advancing past the last candidate persists the population, runs the
    /// epoch and resets the cursor. A persist or epoch failure keeps the
    /// scored episode and leaves the cursor on the last candidate; calling
    /// `end_episode` again retries only the rollover.
    pub fn end_episode<E: Environment>(
        &mut self,
        env: &E,
    ) -> Result<EpisodeReport, ExperimentError> {
        let report = match self.pending_rollover.take() {
            Some(report) => {
                log::info!("Retrying rollover of generation {}", self.generation);
                report
            }
            None => self.score_episode(env)?,
        };

        if self.cursor + 1 >= self.population.len() {
            if let Err(e) = self.advance_generation() {
                self.pending_rollover = Some(report);
                return Err(e);
            }
        } else {
            self.cursor += 1;
        }

        self.runner.restart();
        log::info!("Generation {}, candidate {}", self.generation, self.cursor);
        Ok(report)
    }

    fn score_episode<E: Environment>(&mut self, env: &E) -> Result<EpisodeReport, ExperimentError> {
        let len = self.population.len();
        let candidate = self
            .population
            .candidate_mut(self.cursor)
            .ok_or(ExperimentError::CursorOutOfRange {
                cursor: self.cursor,
                len,
            })?;

        let summary = self.runner.finish(env, candidate);
        let breakdown = self.evaluator.evaluate(&summary);
        candidate.set_fitness(breakdown.fitness);

        log::info!(
            "Ended evaluation of generation {} candidate {}: {:?}, fitness {:.4}",
            self.generation,
            self.cursor,
            summary.status,
            breakdown.fitness
        );

        self.scores.push((breakdown.fitness, summary.winner));
        Ok(EpisodeReport {
            generation: self.generation,
            candidate: self.cursor,
            summary,
            breakdown,
        })
    }

    fn advance_generation(&mut self) -> Result<(), ExperimentError> {
        let stats = GenerationStats::from_scores(self.generation, &self.scores);
        log::info!(
            "Reached end of population: generation {}, highest fitness {:.4}, mean {:.4}, {} winner(s)",
            stats.generation,
            stats.highest_fitness,
            stats.mean_fitness,
            stats.winners
        );

        let path = self.settings.snapshot_path(self.generation);
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("Failed to create snapshot directory {:?}: {}", parent, e);
            }
        }
        self.population
            .persist(&path)
            .map_err(|source| ExperimentError::Persist {
                path: path.clone(),
                source,
            })?;
        log::info!("Saved population snapshot to {:?}", path);

        self.population
            .epoch(self.generation, &mut self.rng)
            .map_err(|source| ExperimentError::Epoch {
                generation: self.generation,
                source,
            })?;

        self.history.push(stats);
        self.scores.clear();
        self.cursor = 0;
        self.generation += 1;
        Ok(())
    }
}
