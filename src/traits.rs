//! Collaborator traits for the evaluation harness
//!
//! The neuroevolution engine and the game environment live outside this
//! crate. These traits are the narrow interface the harness consumes from
//! them, so the episode and experiment logic stays decoupled from either
//! implementation.

use std::path::Path;

use rand::RngCore;

use crate::level::Position;

/// A decision-making network owned by the evolution engine
pub trait DecisionNetwork {
    /// Number of sensor values the network expects per activation
    fn input_len(&self) -> usize;

    /// Number of output activations the network produces
    fn output_len(&self) -> usize;

    /// Load the sensor values for the next forward pass
    fn load_sensors(&mut self, values: &[f32]);

    /// Run one forward pass
    fn activate(&mut self);

    /// Output activations of the last forward pass, in channel order
    fn outputs(&self) -> Vec<f32>;
}

/// One evolved controller under evaluation
///
/// The harness only touches the network and the two result fields.
pub trait Candidate {
    type Network: DecisionNetwork;

    fn network(&self) -> &Self::Network;

    fn network_mut(&mut self) -> &mut Self::Network;

    fn fitness(&self) -> f32;

    fn set_fitness(&mut self, fitness: f32);

    fn is_winner(&self) -> bool;

    fn set_winner(&mut self, winner: bool);
}

/// The current generation of candidates, owned by the evolution engine
pub trait Population {
    type Candidate: Candidate;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn candidate(&self, index: usize) -> Option<&Self::Candidate>;

    fn candidate_mut(&mut self, index: usize) -> Option<&mut Self::Candidate>;

    /// Advance to the next generation in place (selection, reproduction, replacement)
    fn epoch(&mut self, generation: u32, rng: &mut dyn RngCore) -> anyhow::Result<()>;

    /// Write a snapshot of the current population to `path`
    fn persist(&self, path: &Path) -> anyhow::Result<()>;
}

/// Read-only view of the running level
pub trait Environment {
    /// Raw tile identifier at grid coordinates
    fn tile_at(&self, x: i32, y: i32) -> i32;

    /// Agent position in grid coordinates
    fn player_position(&self) -> Position;

    /// Seconds elapsed since the episode started
    fn elapsed_episode_time(&self) -> f32;

    /// Fixed per-run episode time budget in seconds
    fn episode_time_budget(&self) -> f32;
}
