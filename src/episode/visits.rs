//! Visited-state bookkeeping and stagnation detection

use ahash::HashMap;
use serde::{Deserialize, Serialize};

use crate::level::Position;

/// Stagnation thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Seconds without changing position before the agent counts as idle
    pub max_idle_time: f32,
    /// Visits to a single position beyond which the agent counts as looping
    pub max_state_visits: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_idle_time: 2.0,
            max_state_visits: 10,
        }
    }
}

/// How a recorded frame relates to the stagnation thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameActivity {
    /// Moved, or stood still for less than `max_idle_time`
    Active,
    /// Stood still for at least `max_idle_time`
    Stalled,
    /// Moved onto a position visited more than `max_state_visits` times
    OverVisited,
}

impl FrameActivity {
    /// Either stagnation trigger fired on this frame
    pub fn is_idle(self) -> bool {
        self != Self::Active
    }
}

/// Per-episode visit counts keyed by grid position
#[derive(Debug, Clone)]
pub struct VisitTracker {
    config: TrackerConfig,
    last_pos: Option<Position>,
    last_time_moved: f32,
    visits: HashMap<Position, u32>,
}

impl VisitTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            last_pos: None,
            last_time_moved: 0.0,
            visits: HashMap::default(),
        }
    }

    /// Forget everything recorded for the previous episode
    pub fn reset(&mut self) {
        self.last_pos = None;
        self.last_time_moved = 0.0;
        self.visits.clear();
    }

    /// Record the agent's position for this frame
    ///
    /// A move counts a visit to the new position and is over-visited when that
    /// position has now been visited more than `max_state_visits` times.
    /// Standing still stalls once `max_idle_time` has passed since the last move.
    pub fn record_frame(&mut self, pos: Position, now: f32) -> FrameActivity {
        if self.last_pos != Some(pos) {
            self.last_pos = Some(pos);
            self.last_time_moved = now;

            let count = self.visits.entry(pos).or_insert(0);
            *count += 1;
            if *count > self.config.max_state_visits {
                FrameActivity::OverVisited
            } else {
                FrameActivity::Active
            }
        } else if now - self.last_time_moved >= self.config.max_idle_time {
            FrameActivity::Stalled
        } else {
            FrameActivity::Active
        }
    }

    /// True if any position was visited more than `max_state_visits` times
    pub fn has_repeated_states(&self) -> bool {
        self.visits
            .values()
            .any(|&count| count > self.config.max_state_visits)
    }

    /// Number of distinct positions visited this episode
    pub fn states_visited(&self) -> usize {
        self.visits.len()
    }

    pub fn visit_count(&self, pos: Position) -> u32 {
        self.visits.get(&pos).copied().unwrap_or(0)
    }

    pub fn last_position(&self) -> Option<Position> {
        self.last_pos
    }

    pub fn last_time_moved(&self) -> f32 {
        self.last_time_moved
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}
