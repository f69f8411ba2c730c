//! Per-generation summaries

use serde::{Deserialize, Serialize};

/// Outcome of one fully evaluated generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: u32,
    /// Number of episodes scored this generation
    pub evaluated: usize,
    pub highest_fitness: f32,
    pub mean_fitness: f32,
    /// Candidates that reached the exit
    pub winners: usize,
}

impl GenerationStats {
    /// Summarize `(fitness, winner)` pairs recorded during a generation
    pub fn from_scores(generation: u32, scores: &[(f32, bool)]) -> Self {
        let evaluated = scores.len();
        let highest_fitness = scores
            .iter()
            .map(|&(fitness, _)| fitness)
            .fold(f32::NEG_INFINITY, f32::max);
        let total: f32 = scores.iter().map(|&(fitness, _)| fitness).sum();

        Self {
            generation,
            evaluated,
            highest_fitness: if evaluated == 0 { 0.0 } else { highest_fitness },
            mean_fitness: if evaluated == 0 {
                0.0
            } else {
                total / evaluated as f32
            },
            winners: scores.iter().filter(|&&(_, winner)| winner).count(),
        }
    }
}
