//! Episode fitness scoring
//!
//! Combines three signals into one scalar used to rank candidates:
//! - distance progress from the start position (normalized Manhattan distance)
//! - exploration breadth (distinct positions visited, saturating)
//! - time efficiency, chosen by how the episode ended
//!
//! Several alternative combinations are computed alongside the score for
//! diagnostics only. The returned score always uses the exploration-weighted
//! formula.

use serde::{Deserialize, Serialize};

use super::runner::{EpisodeSummary, RunStatus};
use crate::error::SetupError;

/// Scoring constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    /// Largest horizontal distance reachable inside the level
    pub max_distance_x: f32,
    /// Largest vertical distance reachable inside the level
    pub max_distance_y: f32,
    /// Distinct-state count at which exploration reaches 0.5
    pub exploration_half_saturation: f32,
    /// Time score for an episode that used its whole budget without stalling
    pub explored_time_score: f32,
    /// Time score for idle, looping or dead episodes
    pub failed_time_score: f32,
    /// Budget multiplier used as exploration time for explored episodes
    pub explored_time_multiplier: f32,
    /// Budget multiplier used as exploration time for failed episodes
    pub failed_time_multiplier: f32,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            max_distance_x: 39.0,
            max_distance_y: 31.0,
            exploration_half_saturation: 50.0,
            explored_time_score: 0.01,
            failed_time_score: 0.001,
            explored_time_multiplier: 2.0,
            failed_time_multiplier: 3.0,
        }
    }
}

impl FitnessConfig {
    pub fn validate(&self) -> Result<(), SetupError> {
        let positive = [
            ("max_distance_x", self.max_distance_x),
            ("max_distance_y", self.max_distance_y),
            ("exploration_half_saturation", self.exploration_half_saturation),
            ("explored_time_score", self.explored_time_score),
            ("failed_time_score", self.failed_time_score),
            ("explored_time_multiplier", self.explored_time_multiplier),
            ("failed_time_multiplier", self.failed_time_multiplier),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(SetupError::InvalidParameter {
                    name,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Unweighted Manhattan maximum
    pub fn max_distance(&self) -> f32 {
        self.max_distance_x + self.max_distance_y
    }

    /// Manhattan maximum with vertical distance counted twice
    pub fn max_distance_weighted(&self) -> f32 {
        self.max_distance_x + 2.0 * self.max_distance_y
    }
}

/// Alternative combinations, logged but never used for ranking
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitnessDiagnostics {
    pub arithmetic_mean: f32,
    pub weighted_mean: f32,
    pub distance_over_time: f32,
    pub distance_times_time: f32,
    pub distance_times_exploration_time: f32,
    pub harmonic_mean: f32,
}

/// Every intermediate signal of one fitness evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessBreakdown {
    pub status: RunStatus,
    pub distance: f32,
    pub distance_weighted: f32,
    pub normalized_distance: f32,
    pub normalized_distance_weighted: f32,
    pub states_visited: f32,
    pub exploration: f32,
    pub normalized_time: f32,
    pub exploration_time: f32,
    pub diagnostics: FitnessDiagnostics,
    /// The score assigned to the candidate
    pub fitness: f32,
}

/// Scores finished episodes
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    config: FitnessConfig,
}

impl FitnessEvaluator {
    pub fn new(config: FitnessConfig) -> Result<Self, SetupError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &FitnessConfig {
        &self.config
    }

    /// Saturating exploration signal in `[0, 1)`
    pub fn exploration(&self, states_visited: usize) -> f32 {
        let states = (states_visited as f32).max(1.0);
        states / (states + self.config.exploration_half_saturation)
    }

    /// Time score and exploration time for the given outcome
    pub fn time_signal(&self, status: RunStatus, elapsed: f32, budget: f32) -> (f32, f32) {
        match status {
            RunStatus::Won => ((budget - elapsed) / budget, elapsed),
            RunStatus::Explored => (
                self.config.explored_time_score,
                budget * self.config.explored_time_multiplier,
            ),
            RunStatus::Idle | RunStatus::Repeated | RunStatus::Died => (
                self.config.failed_time_score,
                budget * self.config.failed_time_multiplier,
            ),
        }
    }

    pub fn evaluate(&self, summary: &EpisodeSummary) -> FitnessBreakdown {
        let dist_x = (summary.start.x - summary.end.x).abs() as f32;
        let dist_y = (summary.start.y - summary.end.y).abs() as f32;

        let distance = (dist_x + dist_y).max(1.0);
        let distance_weighted = (dist_x + 2.0 * dist_y).max(1.0);

        let (normalized_distance, normalized_distance_weighted) = if summary.winner {
            (1.0, 1.0)
        } else {
            (
                distance / self.config.max_distance(),
                distance_weighted / self.config.max_distance_weighted(),
            )
        };

        let states_visited = (summary.states_visited as f32).max(1.0);
        let exploration = self.exploration(summary.states_visited);

        let budget = summary.time_budget;
        let (normalized_time, exploration_time) =
            self.time_signal(summary.status, summary.elapsed, budget);
        // An exit reached at t = 0 would otherwise divide by zero
        let exploration_time = exploration_time.max(f32::EPSILON);

        let diagnostics = FitnessDiagnostics {
            arithmetic_mean: (normalized_distance + normalized_time) / 2.0,
            weighted_mean: 0.6 * normalized_distance + 0.4 * normalized_time,
            distance_over_time: normalized_distance / normalized_time,
            distance_times_time: normalized_distance * normalized_time,
            distance_times_exploration_time: normalized_distance * exploration_time,
            harmonic_mean: 2.0 / ((1.0 / normalized_distance) + (1.0 / normalized_time)),
        };

        let fitness = (budget * (0.5 * normalized_distance + 0.5 * exploration)) / exploration_time;

        log::debug!(
            "{:?}: distance={distance} (y*2: {distance_weighted}), normalized={normalized_distance:.4} (y*2: {normalized_distance_weighted:.4})",
            summary.status
        );
        log::debug!(
            "states explored={states_visited}, exploration={exploration:.4}, normalized time={normalized_time:.4}, exploration time={exploration_time}"
        );
        log::debug!(
            "fitness AM={:.4} WAM={:.4} DT1={:.4} DT2={:.4} DT3={:.4} HM={:.4} EX={fitness:.4}",
            diagnostics.arithmetic_mean,
            diagnostics.weighted_mean,
            diagnostics.distance_over_time,
            diagnostics.distance_times_time,
            diagnostics.distance_times_exploration_time,
            diagnostics.harmonic_mean,
        );

        FitnessBreakdown {
            status: summary.status,
            distance,
            distance_weighted,
            normalized_distance,
            normalized_distance_weighted,
            states_visited,
            exploration,
            normalized_time,
            exploration_time,
            diagnostics,
            fitness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Position;

    fn evaluator() -> FitnessEvaluator {
        FitnessEvaluator::new(FitnessConfig::default()).unwrap()
    }

    fn summary(status: RunStatus, end: Position, states: usize, elapsed: f32) -> EpisodeSummary {
        EpisodeSummary {
            status,
            start: Position::new(1, 1),
            end,
            states_visited: states,
            elapsed,
            time_budget: 20.0,
            winner: status == RunStatus::Won,
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_won_forces_full_distance() {
        let breakdown = evaluator().evaluate(&summary(RunStatus::Won, Position::new(2, 1), 5, 5.0));
        assert_eq!(breakdown.normalized_distance, 1.0);
        assert_eq!(breakdown.normalized_distance_weighted, 1.0);
        assert!(approx(breakdown.normalized_time, 0.75));
        assert_eq!(breakdown.exploration_time, 5.0);

        let exploration = 5.0 / 55.0;
        let expected = 20.0 * (0.5 + 0.5 * exploration) / 5.0;
        assert!(approx(breakdown.fitness, expected));
    }

    #[test]
    fn test_distance_normalization() {
        let breakdown =
            evaluator().evaluate(&summary(RunStatus::Explored, Position::new(11, 6), 30, 20.0));
        assert_eq!(breakdown.distance, 15.0);
        assert_eq!(breakdown.distance_weighted, 20.0);
        assert!(approx(breakdown.normalized_distance, 15.0 / 70.0));
        assert!(approx(breakdown.normalized_distance_weighted, 20.0 / 101.0));
    }

    #[test]
    fn test_distance_floors_at_one() {
        let breakdown = evaluator().evaluate(&summary(RunStatus::Idle, Position::new(1, 1), 1, 2.0));
        assert_eq!(breakdown.distance, 1.0);
        assert_eq!(breakdown.distance_weighted, 1.0);
        assert!(breakdown.fitness.is_finite());
    }

    #[test]
    fn test_exploration_saturates() {
        let evaluator = evaluator();
        assert!(approx(evaluator.exploration(0), 1.0 / 51.0));
        assert!(approx(evaluator.exploration(1), 1.0 / 51.0));
        assert!(approx(evaluator.exploration(50), 0.5));
        assert!(evaluator.exploration(100_000) < 1.0);
        assert!(evaluator.exploration(200) > evaluator.exploration(100));
    }

    #[test]
    fn test_time_signal_table() {
        let evaluator = evaluator();
        assert_eq!(evaluator.time_signal(RunStatus::Explored, 20.0, 20.0), (0.01, 40.0));
        for status in [RunStatus::Idle, RunStatus::Repeated, RunStatus::Died] {
            assert_eq!(evaluator.time_signal(status, 3.0, 20.0), (0.001, 60.0));
        }
        let (time, exploration_time) = evaluator.time_signal(RunStatus::Won, 4.0, 20.0);
        assert!(approx(time, 0.8));
        assert_eq!(exploration_time, 4.0);
    }

    #[test]
    fn test_score_ignores_diagnostic_formulas() {
        let breakdown =
            evaluator().evaluate(&summary(RunStatus::Died, Position::new(8, 4), 12, 7.0));
        let exploration = 12.0 / 62.0;
        let expected = 20.0 * (0.5 * (10.0 / 70.0) + 0.5 * exploration) / 60.0;
        assert!(approx(breakdown.fitness, expected));
        assert_ne!(breakdown.fitness, breakdown.diagnostics.arithmetic_mean);
        assert_ne!(breakdown.fitness, breakdown.diagnostics.harmonic_mean);
    }

    #[test]
    fn test_outcome_ordering_for_equal_progress() {
        let evaluator = evaluator();
        let end = Position::new(6, 1);
        let won = evaluator.evaluate(&summary(RunStatus::Won, end, 10, 10.0));
        let explored = evaluator.evaluate(&summary(RunStatus::Explored, end, 10, 20.0));
        let idle = evaluator.evaluate(&summary(RunStatus::Idle, end, 10, 4.0));
        assert!(won.fitness > explored.fitness);
        assert!(explored.fitness > idle.fitness);
    }

    #[test]
    fn test_instant_win_is_finite() {
        let breakdown = evaluator().evaluate(&summary(RunStatus::Won, Position::new(1, 1), 1, 0.0));
        assert!(breakdown.fitness.is_finite());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = FitnessConfig {
            max_distance_x: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            FitnessEvaluator::new(config),
            Err(SetupError::InvalidParameter {
                name: "max_distance_x",
                ..
            })
        ));
    }
}
